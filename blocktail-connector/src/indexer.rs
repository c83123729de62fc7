use crate::{
    block::{AbsenceReason, BlockSummary, SlotOutcome},
    client::{BlockRequest, NodeClient},
    error::NodeError,
};
use chrono::DateTime;
use solana_sdk::clock::Slot;
use std::sync::Arc;

/// Turns one slot number into a [`SlotOutcome`].
///
/// The indexer keeps no loop state. It never retries: transport failures go back to the
/// caller, which owns the retry policy.
pub struct BlockIndexer<C: NodeClient + ?Sized> {
    client: Arc<C>,
    request: BlockRequest,
}

impl<C: NodeClient + ?Sized> BlockIndexer<C> {
    pub fn new(client: Arc<C>, request: BlockRequest) -> Self {
        Self { client, request }
    }

    pub fn request(&self) -> &BlockRequest {
        &self.request
    }

    /// Fetches the block at `slot` and derives its summary, or the reason there is none.
    pub async fn index_slot(&self, slot: Slot) -> Result<SlotOutcome, NodeError> {
        let Some(block) = self.client.get_block(slot, &self.request).await? else {
            tracing::info!("No block found for {slot}");
            return Ok(SlotOutcome::Absent {
                reason: AbsenceReason::NotFound,
            });
        };

        let Some(transaction_count) = block.transaction_count else {
            tracing::info!("No transactions in block {slot} at {}", block.blockhash);
            return Ok(SlotOutcome::Absent {
                reason: AbsenceReason::NoTransactionList,
            });
        };

        match block.block_height {
            Some(height) => tracing::info!(
                "{slot} at {} height {height} with {transaction_count} txs and parent {}",
                block.blockhash,
                block.parent_slot
            ),
            None => {
                tracing::warn!(
                    "Received no block height for slot {slot} and blockhash {}",
                    block.blockhash
                );
                tracing::info!(
                    "{slot} at {} with {transaction_count} txs and parent {}",
                    block.blockhash,
                    block.parent_slot
                );
            }
        }

        Ok(SlotOutcome::Indexed(BlockSummary {
            slot,
            blockhash: block.blockhash,
            parent_slot: block.parent_slot,
            transaction_count,
            block_height: block.block_height,
            block_time: block
                .block_time
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        }))
    }
}
