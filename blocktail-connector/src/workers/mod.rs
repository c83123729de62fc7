//! # Tail Manager & Background Worker
//!
//! This module defines the `TailManager`, which owns the polling worker that follows the
//! chain tip.
//!
//! ## Core Components
//!
//! - [`TailManager`]: Owns and runs the `TailWorker`. It is consumed when its `run`
//!   method is called.
//! - [`TailManagerHandle`]: A clonable, thread-safe handle used to stop the running worker.
//! - `TailWorker`: Initializes the cursor, then repeats poll → index → advance → report
//!   until it is stopped or reaches the configured end slot.
//!

mod tail;

use crate::{
    client::NodeClient,
    config::ConnectorConfig,
    error::TailError,
    listener::{ChannelSink, SlotListener},
    sink::SlotSink,
    workers::tail::TailWorker,
};
use solana_sdk::clock::Slot;
use std::sync::Arc;
use tokio::sync::watch;

/// Why a tail run ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// [`TailManagerHandle::stop`] was called.
    Shutdown,
    /// Every slot up to the configured end slot has been processed.
    EndSlotReached,
}

/// What a finished tail run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailSummary {
    /// `None` if the run was stopped before the cursor was initialized.
    pub watermark: Option<Slot>,
    /// Cycles that discovered and processed at least one slot.
    pub cycles: u64,
    pub slots: u64,
    pub stop_reason: StopReason,
}

/// A clonable, thread-safe handle for stopping a [`TailManager`].
#[derive(Debug, Clone)]
pub struct TailManagerHandle {
    shutdown: Arc<watch::Sender<bool>>,
}

impl TailManagerHandle {
    /// Signals the worker to stop.
    ///
    /// The worker observes the signal at its next suspension point; an in-flight node
    /// request is cancelled and the watermark stays at the last completed cycle.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.shutdown.borrow()
    }
}

/// The background service that follows the chain tip.
///
/// Created once, its [`run()`](TailManager::run) future is spawned or awaited, leaving the
/// [`TailManagerHandle`] as the only way to interact with it.
pub struct TailManager<C: NodeClient + ?Sized> {
    worker: TailWorker<C>,
}

impl<C: NodeClient + ?Sized> TailManager<C> {
    /// Creates a new `TailManager` and its associated [`TailManagerHandle`].
    ///
    /// # Arguments
    ///
    /// * `config` - The shared connector configuration, validated here.
    /// * `client` - A shared node client.
    /// * `sink` - Receives one record per processed slot and one report per cycle.
    pub fn new(
        config: Arc<ConnectorConfig>,
        client: Arc<C>,
        sink: Arc<dyn SlotSink>,
    ) -> Result<(Self, TailManagerHandle), TailError> {
        config.validate()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = TailWorker::new(&config, client, sink, shutdown_rx);

        let handle = TailManagerHandle {
            shutdown: Arc::new(shutdown_tx),
        };

        Ok((Self { worker }, handle))
    }

    /// Like [`TailManager::new`], emitting into a [`SlotListener`] sized by
    /// `channels.listener-event-buffer`.
    pub fn with_listener(
        config: Arc<ConnectorConfig>,
        client: Arc<C>,
    ) -> Result<(Self, TailManagerHandle, SlotListener), TailError> {
        let (sink, listener) = ChannelSink::new(config.channels.listener_event_buffer);
        let (manager, handle) = Self::new(config, client, Arc::new(sink))?;
        Ok((manager, handle, listener))
    }

    /// Runs the worker until it is stopped, reaches the end slot, or fails.
    pub async fn run(self) -> Result<TailSummary, TailError> {
        tracing::info!("Tail manager is running.");

        let result = self.worker.run().await;
        match &result {
            Ok(summary) => tracing::info!(
                watermark = summary.watermark,
                cycles = summary.cycles,
                slots = summary.slots,
                "Tail worker has shut down ({:?}).",
                summary.stop_reason
            ),
            Err(e) => tracing::error!("Tail worker exited with an error: {}", e),
        }
        result
    }
}
