use solana_client::client_error::ClientError;
use solana_sdk::clock::Slot;
use thiserror::Error;

/// A failure while talking to the node.
///
/// Absent blocks are never reported through this type; see
/// [`crate::client::NodeClient::get_block`].
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("RPC client error: {0}")]
    Client(#[from] ClientError),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Rejected configuration values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Commitment '{0}' is not supported for block retrieval, use 'confirmed' or 'finalized'")]
    UnsupportedCommitment(String),

    #[error("fetch-concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("start-slot must be at least 1")]
    GenesisStartSlot,

    #[error("max-range-slots must be between 1 and 500000, got {0}")]
    InvalidRangeWindow(u64),

    #[error("start-slot {start} is past end-slot {end}")]
    InvertedSlotBounds { start: Slot, end: Slot },

    #[error("Retry multiplier must be >= 1.0, got {0}")]
    InvalidMultiplier(String),
}

/// Errors that end a tail run.
#[derive(Error, Debug)]
pub enum TailError {
    #[error("Node request failed: {0}")]
    Node(#[from] NodeError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Cursor has not been initialized")]
    Uninitialized,

    #[error("Watermark cannot move backwards from {current} to {requested}")]
    WatermarkRegression { current: Slot, requested: Slot },
}

impl TailError {
    /// Returns `true` if the error came from the node rather than from local state.
    pub fn is_node(&self) -> bool {
        matches!(self, Self::Node(_))
    }
}
