use anyhow::{Context, Result};
use blocktail_connector::config::ConnectorConfig;
use blocktail_logger::LogConfig;
use serde::Deserialize;

/// Prefix of environment variables that override the file, e.g.
/// `BLOCKTAIL__CONNECTOR__SOLANA__RPC_URL`.
pub const ENV_PREFIX: &str = "BLOCKTAIL";

/// The top-level configuration for the blocktail listener.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ListenerConfig {
    #[serde(default)]
    pub connector: ConnectorConfig,
    #[serde(default)]
    pub listener: ListenerSpecificConfig,
}

/// Contains settings that are unique to the listener binary.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ListenerSpecificConfig {
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Loads the listener configuration from a specified TOML file.
///
/// It uses the `config` crate to read the file, layers `BLOCKTAIL__`-prefixed
/// environment variables on top and deserializes the result.
pub fn load_config(path: &str) -> Result<ListenerConfig> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"));

    let settings: ListenerConfig = builder
        .build()
        .context(format!("Failed to build configuration from '{}'", path))?
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    settings
        .connector
        .validate()
        .context("Invalid connector configuration")?;

    Ok(settings)
}
