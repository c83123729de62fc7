#![allow(dead_code)]

use async_trait::async_trait;
use blocktail_connector::{
    client::{BlockRequest, NodeBlock, NodeClient},
    config::ConnectorConfig,
    error::NodeError,
};
use solana_sdk::{clock::Slot, commitment_config::CommitmentLevel};
use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

/// A scripted node used in place of the RPC client.
///
/// Range queries are answered from a queue; once it runs dry every range is empty.
/// Tip queries walk through their script and then keep returning the last entry.
#[derive(Default)]
pub struct MockNode {
    tips: Mutex<VecDeque<Result<Slot, String>>>,
    ranges: Mutex<VecDeque<Result<Vec<Slot>, String>>>,
    blocks: HashMap<Slot, NodeBlock>,
    delays: HashMap<Slot, Duration>,
    failures: Mutex<HashMap<Slot, u32>>,
    pub range_calls: Mutex<Vec<(Slot, Option<Slot>)>>,
    pub block_calls: Mutex<Vec<Slot>>,
    pub requests: Mutex<Vec<BlockRequest>>,
}

impl MockNode {
    pub fn new(tip: Slot) -> Self {
        Self::default().tip(tip)
    }

    pub fn tip(self, tip: Slot) -> Self {
        self.tips.lock().unwrap().push_back(Ok(tip));
        self
    }

    pub fn tip_error(self, message: &str) -> Self {
        self.tips.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    pub fn range(self, slots: Vec<Slot>) -> Self {
        self.ranges.lock().unwrap().push_back(Ok(slots));
        self
    }

    pub fn range_error(self, message: &str) -> Self {
        self.ranges.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    pub fn block(mut self, slot: Slot, transactions: Option<usize>) -> Self {
        self.blocks.insert(slot, node_block(slot, transactions));
        self
    }

    pub fn delay(mut self, slot: Slot, millis: u64) -> Self {
        self.delays.insert(slot, Duration::from_millis(millis));
        self
    }

    /// Makes the first `times` fetches of `slot` fail with a transport error.
    pub fn fail_block(self, slot: Slot, times: u32) -> Self {
        self.failures.lock().unwrap().insert(slot, times);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn block_calls(&self) -> Vec<Slot> {
        self.block_calls.lock().unwrap().clone()
    }

    pub fn range_calls(&self) -> Vec<(Slot, Option<Slot>)> {
        self.range_calls.lock().unwrap().clone()
    }
}

pub fn node_block(slot: Slot, transactions: Option<usize>) -> NodeBlock {
    NodeBlock {
        blockhash: format!("hash-{slot}"),
        previous_blockhash: format!("hash-{}", slot - 1),
        parent_slot: slot - 1,
        block_height: Some(slot - 10),
        block_time: Some(1_700_000_000 + slot as i64),
        transaction_count: transactions,
    }
}

#[async_trait]
impl NodeClient for MockNode {
    async fn get_tip_slot(&self, _commitment: CommitmentLevel) -> Result<Slot, NodeError> {
        let mut tips = self.tips.lock().unwrap();
        let tip = if tips.len() > 1 {
            tips.pop_front()
        } else {
            tips.front().cloned()
        };
        match tip {
            Some(Ok(tip)) => Ok(tip),
            Some(Err(message)) => Err(NodeError::Transport(message)),
            None => Err(NodeError::Transport("no tip scripted".to_string())),
        }
    }

    async fn get_slots_in_range(
        &self,
        from_exclusive: Slot,
        to: Option<Slot>,
        _commitment: CommitmentLevel,
    ) -> Result<Vec<Slot>, NodeError> {
        self.range_calls.lock().unwrap().push((from_exclusive, to));
        match self.ranges.lock().unwrap().pop_front() {
            Some(Ok(slots)) => Ok(slots),
            Some(Err(message)) => Err(NodeError::Transport(message)),
            None => Ok(Vec::new()),
        }
    }

    async fn get_block(
        &self,
        slot: Slot,
        request: &BlockRequest,
    ) -> Result<Option<NodeBlock>, NodeError> {
        self.block_calls.lock().unwrap().push(slot);
        self.requests.lock().unwrap().push(*request);

        if let Some(delay) = self.delays.get(&slot) {
            tokio::time::sleep(*delay).await;
        }

        {
            let mut failures = self.failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(&slot) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(NodeError::Transport(format!("fetch of {slot} timed out")));
                }
            }
        }

        Ok(self.blocks.get(&slot).cloned())
    }
}

/// Defaults with retries switched off and a short idle pause.
pub fn config() -> ConnectorConfig {
    let mut config = ConnectorConfig::default();
    config.retry.max_retries = 0;
    config.tracker.idle_pause_ms = 50;
    config
}
