use crate::block::{CycleReport, SlotOutcome, SlotRecord};
use async_trait::async_trait;

/// Receives everything a tail run emits.
///
/// `on_slot` is called once per processed slot, in ascending slot order, and
/// `on_cycle` once after every cycle that discovered at least one slot.
#[async_trait]
pub trait SlotSink: Send + Sync {
    async fn on_slot(&self, record: &SlotRecord);

    async fn on_cycle(&self, report: &CycleReport);
}

/// Writes records as structured `tracing` events.
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

#[async_trait]
impl SlotSink for TracingSink {
    async fn on_slot(&self, record: &SlotRecord) {
        let elapsed_ms = record.elapsed.as_millis() as u64;
        match &record.outcome {
            SlotOutcome::Indexed(summary) => tracing::debug!(
                target: "blocktail::record",
                slot = summary.slot,
                blockhash = %summary.blockhash,
                parent_slot = summary.parent_slot,
                transaction_count = summary.transaction_count,
                block_height = summary.block_height,
                elapsed_ms,
                "block indexed"
            ),
            SlotOutcome::Absent { reason } => tracing::debug!(
                target: "blocktail::record",
                slot = record.slot,
                reason = %reason,
                elapsed_ms,
                "block absent"
            ),
        }
    }

    async fn on_cycle(&self, report: &CycleReport) {
        tracing::info!(
            first_slot = report.first_slot,
            last_slot = report.last_slot,
            indexed = report.indexed,
            absent = report.absent,
            failed = report.failed,
            "Avg time to index {} blocks {:.2}ms",
            report.slots,
            report.average_latency_ms()
        );
    }
}
