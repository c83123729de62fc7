//! Logging setup shared by the blocktail binaries.
mod logging;

pub use logging::{init, LogConfig, LogFormat, LogOutput};
