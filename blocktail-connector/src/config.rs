#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, retry::RetryConfig};
use solana_sdk::{clock::Slot, commitment_config::CommitmentLevel};
use solana_transaction_status::{TransactionDetails, UiTransactionEncoding};

/// The public mainnet endpoint used when no RPC URL is configured.
pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// The widest slot range a node answers in one `getBlocks` request.
pub const MAX_GET_BLOCKS_RANGE: u64 = 500_000;

/// The top-level configuration for the `blocktail-connector` library.
///
/// This struct aggregates the node connection settings, the polling behavior of the
/// cursor tracker, the retry policy for node calls and channel capacities. It is
/// typically deserialized from a configuration file and handed to the
/// [`TailManager`](crate::workers::TailManager), which treats it as immutable for the
/// lifetime of a run.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub struct ConnectorConfig {
    #[cfg_attr(feature = "serde", serde(default))]
    pub solana: Solana,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tracker: Tracker,
    #[cfg_attr(feature = "serde", serde(default))]
    pub retry: RetryConfig,
    #[cfg_attr(feature = "serde", serde(default))]
    pub channels: ChannelConfig,
}

/// Defines the connection settings for the Solana cluster and the shape of block requests.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case", default))]
pub struct Solana {
    pub rpc_url: String,
    /// Used for tip discovery and block retrieval alike.
    #[cfg_attr(feature = "serde", serde(with = "serde_commitment"))]
    pub commitment: CommitmentLevel,
    pub transaction_details: TransactionDetails,
    pub encoding: UiTransactionEncoding,
    pub include_rewards: bool,
    pub max_supported_transaction_version: u8,
}

/// Defines the polling behavior of the cursor tracker.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case", default))]
pub struct Tracker {
    /// Pause after a cycle that discovered no new slots.
    pub idle_pause_ms: u64,
    /// First slot to index. `None` starts at the current tip. Must be at least 1,
    /// the genesis slot cannot be backfilled.
    pub start_slot: Option<Slot>,
    /// Last slot to index. `None` follows the tip forever.
    pub end_slot: Option<Slot>,
    /// Widest slot range asked for in one poll. A backlog is worked off in windows
    /// of this size, each one its own cycle.
    pub max_range_slots: u64,
    /// How many block fetches of one cycle may be in flight at once.
    pub fetch_concurrency: usize,
    /// What to do with a slot whose fetch still fails after all retries.
    pub on_slot_error: SlotErrorPolicy,
}

/// Reaction to a slot that could not be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum SlotErrorPolicy {
    /// End the run with the error.
    #[default]
    Abort,
    /// Log the failure and continue with the next slot.
    Skip,
}

/// Defines capacities for the MPSC channels within the connector.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case", default))]
pub struct ChannelConfig {
    /// The buffer capacity of a [`SlotListener`](crate::listener::SlotListener) channel.
    pub listener_event_buffer: usize,
}

impl ConnectorConfig {
    /// Checks the values a run cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.solana.commitment == CommitmentLevel::Processed {
            return Err(ConfigError::UnsupportedCommitment("processed".to_string()));
        }
        if self.tracker.fetch_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.tracker.start_slot == Some(0) {
            return Err(ConfigError::GenesisStartSlot);
        }
        if self.tracker.max_range_slots == 0 || self.tracker.max_range_slots > MAX_GET_BLOCKS_RANGE
        {
            return Err(ConfigError::InvalidRangeWindow(self.tracker.max_range_slots));
        }
        if let (Some(start), Some(end)) = (self.tracker.start_slot, self.tracker.end_slot) {
            if start > end {
                return Err(ConfigError::InvertedSlotBounds { start, end });
            }
        }
        if self.retry.multiplier.is_nan() || self.retry.multiplier < 1.0 {
            return Err(ConfigError::InvalidMultiplier(self.retry.multiplier.to_string()));
        }
        Ok(())
    }
}

impl Default for Solana {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            commitment: CommitmentLevel::Finalized,
            transaction_details: TransactionDetails::Full,
            encoding: UiTransactionEncoding::Base64,
            include_rewards: false,
            max_supported_transaction_version: 0,
        }
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self {
            idle_pause_ms: 500,
            start_slot: None,
            end_slot: None,
            max_range_slots: 1_000,
            fetch_concurrency: 1,
            on_slot_error: SlotErrorPolicy::Abort,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            listener_event_buffer: 128,
        }
    }
}

#[cfg(feature = "serde")]
mod serde_commitment {

    use super::*;
    use serde::{de::Error, Deserializer, Serializer};

    pub fn serialize<S>(c: &CommitmentLevel, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = match c {
            CommitmentLevel::Processed => "processed",
            CommitmentLevel::Confirmed => "confirmed",
            CommitmentLevel::Finalized => "finalized",
        };
        serializer.serialize_str(s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<CommitmentLevel, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        match s.to_lowercase().as_str() {
            "processed" => Ok(CommitmentLevel::Processed),
            "confirmed" => Ok(CommitmentLevel::Confirmed),
            "finalized" => Ok(CommitmentLevel::Finalized),
            other => Err(D::Error::custom(format!("unknown commitment level '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_finalized_full_blocks() {
        let config = ConnectorConfig::default();
        assert_eq!(config.solana.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.solana.commitment, CommitmentLevel::Finalized);
        assert_eq!(config.solana.transaction_details, TransactionDetails::Full);
        assert!(!config.solana.include_rewards);
        assert_eq!(config.tracker.idle_pause_ms, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn processed_commitment_is_rejected() {
        let mut config = ConnectorConfig::default();
        config.solana.commitment = CommitmentLevel::Processed;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnsupportedCommitment(_))
        ));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let mut config = ConnectorConfig::default();
        config.tracker.start_slot = Some(200);
        config.tracker.end_slot = Some(100);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedSlotBounds { start: 200, end: 100 })
        );
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut config = ConnectorConfig::default();
        config.tracker.fetch_concurrency = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroConcurrency));
    }

    #[test]
    fn genesis_start_slot_is_rejected() {
        let mut config = ConnectorConfig::default();
        config.tracker.start_slot = Some(0);
        assert_eq!(config.validate(), Err(ConfigError::GenesisStartSlot));

        config.tracker.start_slot = Some(1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn range_window_must_fit_one_request() {
        let mut config = ConnectorConfig::default();
        config.tracker.max_range_slots = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidRangeWindow(0)));

        config.tracker.max_range_slots = MAX_GET_BLOCKS_RANGE + 1;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidRangeWindow(MAX_GET_BLOCKS_RANGE + 1))
        );

        config.tracker.max_range_slots = MAX_GET_BLOCKS_RANGE;
        assert!(config.validate().is_ok());
    }
}
