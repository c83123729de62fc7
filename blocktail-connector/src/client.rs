//! # Node Access
//!
//! The connector never talks to the RPC client directly. Every node call goes through
//! the [`NodeClient`] trait, which the nonblocking Solana `RpcClient` implements and
//! which tests replace with a scripted mock.
//!
//! ## Absent blocks
//!
//! The Solana RPC answers a request for a slot without a block with a JSON-RPC error.
//! [`NodeClient::get_block`] turns those specific error codes into `Ok(None)` so the
//! indexer can tell "nothing there" apart from a broken connection.

use crate::{config::Solana, error::NodeError};
use async_trait::async_trait;
use solana_client::{
    client_error::{ClientError, ClientErrorKind},
    nonblocking::rpc_client::RpcClient,
    rpc_config::RpcBlockConfig,
};
use solana_rpc_client_api::{
    custom_error::{
        JSON_RPC_SERVER_ERROR_BLOCK_NOT_AVAILABLE,
        JSON_RPC_SERVER_ERROR_BLOCK_STATUS_NOT_AVAILABLE_YET,
        JSON_RPC_SERVER_ERROR_LONG_TERM_STORAGE_SLOT_SKIPPED,
        JSON_RPC_SERVER_ERROR_SLOT_SKIPPED,
    },
    request::RpcError,
};
use solana_sdk::{
    clock::{Slot, UnixTimestamp},
    commitment_config::{CommitmentConfig, CommitmentLevel},
};
use solana_transaction_status::{TransactionDetails, UiConfirmedBlock, UiTransactionEncoding};

/// The options of a single block request.
///
/// Built once per run from [`Solana`] so the commitment used for block retrieval is the
/// same one used for tip discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRequest {
    pub commitment: CommitmentLevel,
    pub transaction_details: TransactionDetails,
    pub encoding: UiTransactionEncoding,
    pub include_rewards: bool,
    pub max_supported_transaction_version: u8,
}

impl From<&Solana> for BlockRequest {
    fn from(solana: &Solana) -> Self {
        Self {
            commitment: solana.commitment,
            transaction_details: solana.transaction_details,
            encoding: solana.encoding,
            include_rewards: solana.include_rewards,
            max_supported_transaction_version: solana.max_supported_transaction_version,
        }
    }
}

impl From<&BlockRequest> for RpcBlockConfig {
    fn from(request: &BlockRequest) -> Self {
        RpcBlockConfig {
            encoding: Some(request.encoding),
            transaction_details: Some(request.transaction_details),
            rewards: Some(request.include_rewards),
            commitment: Some(CommitmentConfig {
                commitment: request.commitment,
            }),
            max_supported_transaction_version: Some(request.max_supported_transaction_version),
        }
    }
}

/// The connector-side view of a block returned by the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeBlock {
    pub blockhash: String,
    pub previous_blockhash: String,
    pub parent_slot: Slot,
    pub block_height: Option<u64>,
    pub block_time: Option<UnixTimestamp>,
    /// `None` when the node returned no transaction list at all.
    pub transaction_count: Option<usize>,
}

impl From<UiConfirmedBlock> for NodeBlock {
    fn from(block: UiConfirmedBlock) -> Self {
        // Signature-only requests carry `signatures` instead of `transactions`.
        let transaction_count = block
            .transactions
            .as_ref()
            .map(Vec::len)
            .or_else(|| block.signatures.as_ref().map(Vec::len));

        Self {
            blockhash: block.blockhash,
            previous_blockhash: block.previous_blockhash,
            parent_slot: block.parent_slot,
            block_height: block.block_height,
            block_time: block.block_time,
            transaction_count,
        }
    }
}

/// A trait abstracting over the node capabilities the connector consumes.
///
/// Implementations are shared read-only between the cursor tracker and the block
/// indexer, usually behind an `Arc`.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Returns the highest slot the node knows at `commitment`.
    async fn get_tip_slot(&self, commitment: CommitmentLevel) -> Result<Slot, NodeError>;

    /// Returns every produced slot greater than `from_exclusive` and up to `to`
    /// (or up to the node's tip when `to` is `None`), in ascending order.
    async fn get_slots_in_range(
        &self,
        from_exclusive: Slot,
        to: Option<Slot>,
        commitment: CommitmentLevel,
    ) -> Result<Vec<Slot>, NodeError>;

    /// Returns the block at `slot`, or `None` if the node has no block there.
    async fn get_block(
        &self,
        slot: Slot,
        request: &BlockRequest,
    ) -> Result<Option<NodeBlock>, NodeError>;
}

#[async_trait]
impl NodeClient for RpcClient {
    async fn get_tip_slot(&self, commitment: CommitmentLevel) -> Result<Slot, NodeError> {
        self.get_slot_with_commitment(CommitmentConfig { commitment })
            .await
            .map_err(Into::into)
    }

    async fn get_slots_in_range(
        &self,
        from_exclusive: Slot,
        to: Option<Slot>,
        commitment: CommitmentLevel,
    ) -> Result<Vec<Slot>, NodeError> {
        // `getBlocks` is inclusive of its start slot.
        let start = from_exclusive.saturating_add(1);
        if matches!(to, Some(end) if end < start) {
            return Ok(Vec::new());
        }
        self.get_blocks_with_commitment(start, to, CommitmentConfig { commitment })
            .await
            .map_err(Into::into)
    }

    async fn get_block(
        &self,
        slot: Slot,
        request: &BlockRequest,
    ) -> Result<Option<NodeBlock>, NodeError> {
        match self.get_block_with_config(slot, request.into()).await {
            Ok(block) => Ok(Some(block.into())),
            Err(err) if is_missing_block(&err) => {
                tracing::debug!(slot, error = %err, "Node reports no block");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Returns `true` if the node answered with one of the "no block at this slot" codes.
pub fn is_missing_block(err: &ClientError) -> bool {
    match err.kind() {
        ClientErrorKind::RpcError(RpcError::RpcResponseError { code, .. }) => {
            is_missing_block_code(*code)
        }
        _ => false,
    }
}

fn is_missing_block_code(code: i64) -> bool {
    matches!(
        code,
        JSON_RPC_SERVER_ERROR_BLOCK_NOT_AVAILABLE
            | JSON_RPC_SERVER_ERROR_SLOT_SKIPPED
            | JSON_RPC_SERVER_ERROR_LONG_TERM_STORAGE_SLOT_SKIPPED
            | JSON_RPC_SERVER_ERROR_BLOCK_STATUS_NOT_AVAILABLE_YET
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_rpc_client_api::request::RpcResponseErrorData;

    fn response_error(code: i64) -> ClientError {
        ClientError::from(ClientErrorKind::RpcError(RpcError::RpcResponseError {
            code,
            message: format!("error {code}"),
            data: RpcResponseErrorData::Empty,
        }))
    }

    #[test]
    fn skipped_and_unavailable_slots_are_missing_blocks() {
        assert!(is_missing_block(&response_error(-32004)));
        assert!(is_missing_block(&response_error(-32007)));
        assert!(is_missing_block(&response_error(-32009)));
        assert!(is_missing_block(&response_error(-32014)));
    }

    #[test]
    fn other_errors_are_transport_failures() {
        assert!(!is_missing_block(&response_error(-32005)));
        assert!(!is_missing_block(&ClientError::from(ClientErrorKind::Custom(
            "connection refused".to_string()
        ))));
    }

    #[test]
    fn block_request_carries_run_settings() {
        let request = BlockRequest::from(&Solana::default());
        let config = RpcBlockConfig::from(&request);
        assert_eq!(config.rewards, Some(false));
        assert_eq!(config.max_supported_transaction_version, Some(0));
        assert_eq!(config.transaction_details, Some(TransactionDetails::Full));
        assert_eq!(config.encoding, Some(UiTransactionEncoding::Base64));
        assert_eq!(
            config.commitment,
            Some(CommitmentConfig {
                commitment: CommitmentLevel::Finalized
            })
        );
    }

    #[test]
    fn missing_transaction_list_is_kept_distinct_from_empty() {
        let mut block = UiConfirmedBlock {
            previous_blockhash: "prev".to_string(),
            blockhash: "hash".to_string(),
            parent_slot: 104,
            transactions: None,
            signatures: None,
            rewards: None,
            num_reward_partitions: None,
            block_time: Some(1_700_000_000),
            block_height: Some(90),
        };
        assert_eq!(NodeBlock::from(block.clone()).transaction_count, None);

        block.transactions = Some(Vec::new());
        assert_eq!(NodeBlock::from(block.clone()).transaction_count, Some(0));

        block.transactions = None;
        block.signatures = Some(vec!["sig".to_string(); 3]);
        assert_eq!(NodeBlock::from(block).transaction_count, Some(3));
    }
}
