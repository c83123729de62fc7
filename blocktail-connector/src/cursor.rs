//! Cursor tracker: owns the watermark and discovers new slots.

use crate::{
    client::NodeClient, config::MAX_GET_BLOCKS_RANGE, error::TailError, retry::RetryPolicy,
};
use solana_sdk::{clock::Slot, commitment_config::CommitmentLevel};
use std::sync::Arc;

/// The tracker's position in the chain.
///
/// Moves from `Uninitialized` to `Polling` once and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Uninitialized,
    /// `watermark` is the highest slot already indexed by this run.
    Polling { watermark: Slot },
}

/// What a single poll discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing past the watermark yet.
    NoProgress,
    /// New slots, strictly ascending, all greater than the watermark.
    Slots(Vec<Slot>),
}

pub struct CursorTracker<C: NodeClient + ?Sized> {
    client: Arc<C>,
    commitment: CommitmentLevel,
    retry: RetryPolicy,
    start_slot: Option<Slot>,
    end_slot: Option<Slot>,
    max_range: u64,
    state: CursorState,
}

impl<C: NodeClient + ?Sized> CursorTracker<C> {
    pub fn new(client: Arc<C>, commitment: CommitmentLevel, retry: RetryPolicy) -> Self {
        Self {
            client,
            commitment,
            retry,
            start_slot: None,
            end_slot: None,
            max_range: MAX_GET_BLOCKS_RANGE,
            state: CursorState::Uninitialized,
        }
    }

    /// Restricts the run to `start..=end`. `None` on either side leaves it open.
    pub fn with_bounds(mut self, start_slot: Option<Slot>, end_slot: Option<Slot>) -> Self {
        self.start_slot = start_slot;
        self.end_slot = end_slot;
        self
    }

    /// Caps every range query at `max_range` slots past its start.
    pub fn with_max_range(mut self, max_range: u64) -> Self {
        self.max_range = max_range.clamp(1, MAX_GET_BLOCKS_RANGE);
        self
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn commitment(&self) -> CommitmentLevel {
        self.commitment
    }

    pub fn watermark(&self) -> Option<Slot> {
        match self.state {
            CursorState::Uninitialized => None,
            CursorState::Polling { watermark } => Some(watermark),
        }
    }

    pub fn end_slot(&self) -> Option<Slot> {
        self.end_slot
    }

    /// Returns `true` once the watermark has reached the configured end slot.
    pub fn is_finished(&self) -> bool {
        matches!(
            (self.watermark(), self.end_slot),
            (Some(watermark), Some(end)) if watermark >= end
        )
    }

    /// Queries the current tip at the run's commitment.
    pub async fn tip(&self) -> Result<Slot, TailError> {
        let tip = self
            .retry
            .run("getSlot", || self.client.get_tip_slot(self.commitment))
            .await?;
        Ok(tip)
    }

    /// Sets the watermark from the node's tip and enters the polling state.
    ///
    /// With a start slot configured, the watermark is placed just before it so the
    /// first cycle indexes the start slot itself. Calling this again while polling is a
    /// no-op that returns the current watermark.
    pub async fn initialize(&mut self) -> Result<Slot, TailError> {
        if let CursorState::Polling { watermark } = self.state {
            return Ok(watermark);
        }

        let tip = self.tip().await?;
        let watermark = match self.start_slot {
            Some(start) => {
                tracing::info!(tip, start, "Backfilling from configured start slot");
                start.saturating_sub(1)
            }
            None => tip,
        };

        self.state = CursorState::Polling { watermark };
        Ok(watermark)
    }

    /// Asks the node for the slots past the watermark, at most `max_range` of them.
    ///
    /// The returned slots are filtered, sorted and deduplicated, so callers may rely on
    /// strictly ascending order past the watermark. A window the chain skipped entirely
    /// is stepped over while it lies below the tip; the watermark itself only ever moves
    /// through [`advance`](Self::advance).
    pub async fn poll_cycle(&self) -> Result<PollOutcome, TailError> {
        let watermark = self.watermark().ok_or(TailError::Uninitialized)?;
        let mut from = watermark;

        loop {
            let to = self.window_end(from);
            let mut slots = self
                .retry
                .run("getBlocks", || {
                    self.client
                        .get_slots_in_range(from, Some(to), self.commitment)
                })
                .await?;

            let newest = slots.iter().max().copied();
            slots.retain(|slot| *slot > watermark);
            slots.sort_unstable();
            slots.dedup();

            if !slots.is_empty() {
                return Ok(PollOutcome::Slots(slots));
            }

            let at_end = matches!(self.end_slot, Some(end) if to >= end);
            if at_end || self.tip().await? <= to {
                match newest {
                    None => tracing::warn!("{watermark} No slots"),
                    Some(_) => tracing::warn!("No new slots for {watermark}"),
                }
                return Ok(PollOutcome::NoProgress);
            }

            tracing::debug!(from, to, "No blocks in range below the tip, moving on");
            from = to;
        }
    }

    fn window_end(&self, from: Slot) -> Slot {
        let to = from.saturating_add(self.max_range);
        match self.end_slot {
            Some(end) => to.min(end),
            None => to,
        }
    }

    /// Moves the watermark forward after a range has been fully processed.
    pub fn advance(&mut self, new_watermark: Slot) -> Result<(), TailError> {
        let CursorState::Polling { watermark } = self.state else {
            return Err(TailError::Uninitialized);
        };
        if new_watermark < watermark {
            return Err(TailError::WatermarkRegression {
                current: watermark,
                requested: new_watermark,
            });
        }
        self.state = CursorState::Polling {
            watermark: new_watermark,
        };
        Ok(())
    }
}
