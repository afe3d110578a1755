//! Shared helpers for herald-watch integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use herald_watch::{FaultHandler, MessageSender, WatchError};
use parking_lot::Mutex;

/// Fault handler that records every fault it sees.
#[derive(Default)]
pub struct FaultLog {
    faults: Mutex<Vec<String>>,
}

impl FaultLog {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.faults.lock().len()
    }

    pub fn messages(&self) -> Vec<String> {
        self.faults.lock().clone()
    }
}

impl FaultHandler for FaultLog {
    fn on_fault(&self, fault: &WatchError) {
        self.faults.lock().push(fault.to_string());
    }
}

/// Sender that records deliveries and fails on marked messages.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(u64, String)>>,
    missing_channels: HashSet<u64>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_channel(mut self, channel_id: u64) -> Self {
        self.missing_channels.insert(channel_id);
        self
    }

    pub fn sent(&self) -> Vec<(u64, String)> {
        self.sent.lock().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

impl MessageSender for RecordingSender {
    fn resolve(&self, channel_id: u64) -> bool {
        !self.missing_channels.contains(&channel_id)
    }

    fn deliver(&self, channel_id: u64, text: &str) -> anyhow::Result<()> {
        if text.starts_with("fail") {
            anyhow::bail!("channel {} refused message", channel_id);
        }
        if text.starts_with("panic") {
            panic!("sender crashed");
        }
        self.sent.lock().push((channel_id, text.to_string()));
        Ok(())
    }
}

/// Polls `condition` every few milliseconds until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}
