//! # Slot Listener
//!
//! A channel-backed [`SlotSink`] and the receiving end that applications read from.
//! The sink forwards every record into a bounded MPSC channel; the [`SlotListener`]
//! exposes it either as individual events or as a `Stream`.

use crate::{
    block::{CycleReport, SlotRecord},
    sink::SlotSink,
};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Everything a tail run emits, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailEvent {
    Slot(SlotRecord),
    Cycle(CycleReport),
}

/// Sends every emitted record to a [`SlotListener`].
///
/// Sending waits for channel capacity, so a slow listener slows the tail run down
/// instead of losing records.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<TailEvent>,
}

impl ChannelSink {
    /// Creates a connected sink and listener pair.
    pub fn new(capacity: usize) -> (Self, SlotListener) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, SlotListener { rx })
    }

    async fn send(&self, event: TailEvent) {
        if self.tx.send(event).await.is_err() {
            tracing::warn!("Failed to emit record: listener has been dropped");
        }
    }
}

#[async_trait]
impl SlotSink for ChannelSink {
    async fn on_slot(&self, record: &SlotRecord) {
        self.send(TailEvent::Slot(record.clone())).await;
    }

    async fn on_cycle(&self, report: &CycleReport) {
        self.send(TailEvent::Cycle(report.clone())).await;
    }
}

/// The receiving end of a [`ChannelSink`].
#[derive(Debug)]
pub struct SlotListener {
    rx: mpsc::Receiver<TailEvent>,
}

impl SlotListener {
    /// Receives the next event. Returns `None` once the tail run has ended and every
    /// buffered event has been read.
    pub async fn next_event(&mut self) -> Option<TailEvent> {
        self.rx.recv().await
    }

    /// Converts the listener into a `Stream` of events.
    pub fn into_stream(self) -> ReceiverStream<TailEvent> {
        ReceiverStream::new(self.rx)
    }
}
