use crate::{
    block::{CycleReport, SlotRecord},
    client::{BlockRequest, NodeClient},
    config::{ConnectorConfig, SlotErrorPolicy},
    cursor::{CursorTracker, PollOutcome},
    error::TailError,
    indexer::BlockIndexer,
    retry::RetryPolicy,
    sink::SlotSink,
    workers::{StopReason, TailSummary},
};
use futures::StreamExt;
use solana_sdk::clock::Slot;
use std::{future::Future, sync::Arc, time::Duration};
use tokio::{
    sync::watch,
    time::{sleep, Instant},
};

pub struct TailWorker<C: NodeClient + ?Sized> {
    cursor: CursorTracker<C>,
    indexer: BlockIndexer<C>,
    retry: RetryPolicy,
    sink: Arc<dyn SlotSink>,
    idle_pause: Duration,
    fetch_concurrency: usize,
    on_slot_error: SlotErrorPolicy,
    shutdown: watch::Receiver<bool>,
}

impl<C: NodeClient + ?Sized> TailWorker<C> {
    pub fn new(
        config: &ConnectorConfig,
        client: Arc<C>,
        sink: Arc<dyn SlotSink>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let retry = RetryPolicy::new(config.retry.clone());
        let cursor = CursorTracker::new(client.clone(), config.solana.commitment, retry.clone())
            .with_bounds(config.tracker.start_slot, config.tracker.end_slot)
            .with_max_range(config.tracker.max_range_slots);
        let indexer = BlockIndexer::new(client, BlockRequest::from(&config.solana));

        Self {
            cursor,
            indexer,
            retry,
            sink,
            idle_pause: Duration::from_millis(config.tracker.idle_pause_ms),
            fetch_concurrency: config.tracker.fetch_concurrency.max(1),
            on_slot_error: config.tracker.on_slot_error,
            shutdown,
        }
    }

    pub async fn run(mut self) -> Result<TailSummary, TailError> {
        let mut cycles = 0;
        let mut indexed_slots = 0;

        let stop_reason = 'run: {
            let Some(watermark) = until_stopped(&self.shutdown, self.cursor.initialize())
                .await
                .transpose()?
            else {
                break 'run StopReason::Shutdown;
            };

            tracing::info!(
                "Listening to blocks {:?} with {:?} transaction details from slot {watermark}",
                self.cursor.commitment(),
                self.indexer.request().transaction_details
            );

            // Set once the tip is known to be past the end slot, so the next empty
            // range is final.
            let mut end_confirmed = false;

            loop {
                if self.cursor.is_finished() {
                    break 'run StopReason::EndSlotReached;
                }

                let Some(poll) = until_stopped(&self.shutdown, self.cursor.poll_cycle())
                    .await
                    .transpose()?
                else {
                    break 'run StopReason::Shutdown;
                };

                let slots = match poll {
                    PollOutcome::Slots(slots) => slots,
                    PollOutcome::NoProgress => {
                        if let Some(end) = self.cursor.end_slot() {
                            if end_confirmed {
                                break 'run StopReason::EndSlotReached;
                            }
                            let Some(tip) = until_stopped(&self.shutdown, self.cursor.tip())
                                .await
                                .transpose()?
                            else {
                                break 'run StopReason::Shutdown;
                            };
                            if tip >= end {
                                end_confirmed = true;
                                continue;
                            }
                        }
                        if until_stopped(&self.shutdown, sleep(self.idle_pause))
                            .await
                            .is_none()
                        {
                            break 'run StopReason::Shutdown;
                        }
                        continue;
                    }
                };

                let (Some(&first), Some(&last)) = (slots.first(), slots.last()) else {
                    continue;
                };

                let Some(report) =
                    until_stopped(&self.shutdown, self.process(&slots, first, last)).await
                else {
                    tracing::warn!(
                        "Stopping mid-cycle, watermark stays at {:?}",
                        self.cursor.watermark()
                    );
                    break 'run StopReason::Shutdown;
                };
                let report = report?;

                self.cursor.advance(last)?;
                cycles += 1;
                indexed_slots += report.slots as u64;

                if until_stopped(&self.shutdown, self.sink.on_cycle(&report))
                    .await
                    .is_none()
                {
                    tracing::warn!("Stopping before the report for {first}..={last} was emitted");
                    break 'run StopReason::Shutdown;
                }
            }
        };

        Ok(TailSummary {
            watermark: self.cursor.watermark(),
            cycles,
            slots: indexed_slots,
            stop_reason,
        })
    }

    /// Indexes `slots` in ascending order and emits one record per slot.
    ///
    /// Up to `fetch_concurrency` fetches run at once; records are still emitted in slot
    /// order.
    async fn process(
        &self,
        slots: &[Slot],
        first: Slot,
        last: Slot,
    ) -> Result<CycleReport, TailError> {
        let mut report = CycleReport::new(first, last, slots.len());
        let indexer = &self.indexer;
        let retry = &self.retry;

        let mut fetches = futures::stream::iter(slots.iter().copied())
            .map(|slot| async move {
                let started = Instant::now();
                let outcome = retry.run("getBlock", || indexer.index_slot(slot)).await;
                (slot, outcome, started.elapsed())
            })
            .buffered(self.fetch_concurrency);

        while let Some((slot, outcome, elapsed)) = fetches.next().await {
            match outcome {
                Ok(outcome) => {
                    let record = SlotRecord {
                        slot,
                        outcome,
                        elapsed,
                    };
                    report.record(&record);
                    self.sink.on_slot(&record).await;
                }
                Err(err) => match self.on_slot_error {
                    SlotErrorPolicy::Abort => return Err(err.into()),
                    SlotErrorPolicy::Skip => {
                        tracing::error!(slot, error = %err, "Giving up on slot after retries");
                        report.record_failure(elapsed);
                    }
                },
            }
        }

        Ok(report)
    }
}

/// Resolves once a stop has been requested.
///
/// A dropped handle is not a stop request; the run then continues until the process ends.
async fn stopped(mut shutdown: watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Drives `fut` unless a stop is requested first, in which case `fut` is dropped.
async fn until_stopped<F: Future>(shutdown: &watch::Receiver<bool>, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = stopped(shutdown.clone()) => None,
        output = fut => Some(output),
    }
}
