//! # Block Records
//!
//! The records the connector emits for every processed slot and every polling cycle.
//! Once constructed they are never mutated; sinks receive them by reference.

#[cfg(feature = "serde")]
use serde::Serialize;

use chrono::{DateTime, Utc};
use solana_sdk::clock::Slot;
use std::{fmt, time::Duration};

/// Summary of a block that was found at a slot and carries a transaction list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct BlockSummary {
    pub slot: Slot,
    pub blockhash: String,
    pub parent_slot: Slot,
    /// Zero for an empty block.
    pub transaction_count: usize,
    pub block_height: Option<u64>,
    pub block_time: Option<DateTime<Utc>>,
}

/// Why no [`BlockSummary`] could be produced for a slot.
///
/// An absence is an expected outcome, not an error: the chain skips slots, and a slot
/// may not be produced yet at the requested commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum AbsenceReason {
    /// The node has no block at this slot.
    NotFound,
    /// The block exists but came back without a transaction list.
    NoTransactionList,
}

impl fmt::Display for AbsenceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbsenceReason::NotFound => f.write_str("no block found"),
            AbsenceReason::NoTransactionList => f.write_str("no transaction list"),
        }
    }
}

/// The result of indexing one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", tag = "kind"))]
pub enum SlotOutcome {
    Indexed(BlockSummary),
    Absent { reason: AbsenceReason },
}

impl SlotOutcome {
    pub fn summary(&self) -> Option<&BlockSummary> {
        match self {
            SlotOutcome::Indexed(summary) => Some(summary),
            SlotOutcome::Absent { .. } => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, SlotOutcome::Absent { .. })
    }
}

/// One emitted record per processed slot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SlotRecord {
    pub slot: Slot,
    pub outcome: SlotOutcome,
    /// Wall-clock time spent fetching this slot, retries included.
    pub elapsed: Duration,
}

/// Aggregate of one polling cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CycleReport {
    pub first_slot: Slot,
    pub last_slot: Slot,
    /// Number of slots the cycle discovered.
    pub slots: usize,
    pub indexed: usize,
    pub absent: usize,
    /// Slots given up on after retries, only non-zero under `SlotErrorPolicy::Skip`.
    pub failed: usize,
    /// Sum of the per-slot durations.
    pub total_elapsed: Duration,
}

impl CycleReport {
    pub(crate) fn new(first_slot: Slot, last_slot: Slot, slots: usize) -> Self {
        Self {
            first_slot,
            last_slot,
            slots,
            indexed: 0,
            absent: 0,
            failed: 0,
            total_elapsed: Duration::ZERO,
        }
    }

    pub(crate) fn record(&mut self, record: &SlotRecord) {
        match record.outcome {
            SlotOutcome::Indexed(_) => self.indexed += 1,
            SlotOutcome::Absent { .. } => self.absent += 1,
        }
        self.total_elapsed += record.elapsed;
    }

    pub(crate) fn record_failure(&mut self, elapsed: Duration) {
        self.failed += 1;
        self.total_elapsed += elapsed;
    }

    /// Average processing latency per slot: total elapsed time divided by the slot count.
    pub fn average_latency(&self) -> Duration {
        match u32::try_from(self.slots) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.total_elapsed / n,
            Err(_) => Duration::from_secs_f64(
                self.total_elapsed.as_secs_f64() / self.slots as f64,
            ),
        }
    }

    pub fn average_latency_ms(&self) -> f64 {
        self.average_latency().as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(slot: Slot, outcome: SlotOutcome, ms: u64) -> SlotRecord {
        SlotRecord {
            slot,
            outcome,
            elapsed: Duration::from_millis(ms),
        }
    }

    fn summary(slot: Slot) -> BlockSummary {
        BlockSummary {
            slot,
            blockhash: format!("hash-{slot}"),
            parent_slot: slot - 1,
            transaction_count: 0,
            block_height: None,
            block_time: None,
        }
    }

    #[test]
    fn average_latency_is_total_over_slot_count() {
        let mut report = CycleReport::new(101, 103, 3);
        report.record(&record(101, SlotOutcome::Indexed(summary(101)), 10));
        report.record(&record(
            102,
            SlotOutcome::Absent {
                reason: AbsenceReason::NotFound,
            },
            20,
        ));
        report.record(&record(103, SlotOutcome::Indexed(summary(103)), 60));

        assert_eq!(report.indexed, 2);
        assert_eq!(report.absent, 1);
        assert_eq!(report.total_elapsed, Duration::from_millis(90));
        assert_eq!(report.average_latency(), Duration::from_millis(30));
        assert!((report.average_latency_ms() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn failures_count_towards_latency() {
        let mut report = CycleReport::new(7, 8, 2);
        report.record(&record(7, SlotOutcome::Indexed(summary(7)), 5));
        report.record_failure(Duration::from_millis(15));

        assert_eq!(report.failed, 1);
        assert_eq!(report.average_latency(), Duration::from_millis(10));
    }

    #[test]
    fn empty_report_has_zero_latency() {
        assert_eq!(CycleReport::new(0, 0, 0).average_latency(), Duration::ZERO);
    }
}
