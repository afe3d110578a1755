//! Process-wide runtime statistics.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use herald_core::Entity;
use herald_watch::{FaultHandler, WatchError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Counters shared by every component of one host.
///
/// Created once by the host and handed out as `Arc<Statistics>`.
#[derive(Debug)]
pub struct Statistics {
    id: String,
    created_at: SystemTime,
    started: Mutex<Instant>,
    faults: AtomicU64,
    command_calls: AtomicU64,
    last_fault: Mutex<Option<String>>,
}

impl Statistics {
    pub fn new() -> Self {
        let created_at = SystemTime::now();
        let millis = created_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();

        Self {
            id: format!("stats-{}-{}", std::process::id(), millis),
            created_at,
            started: Mutex::new(Instant::now()),
            faults: AtomicU64::new(0),
            command_calls: AtomicU64::new(0),
            last_fault: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn record_fault(&self, fault: &WatchError) {
        self.faults.fetch_add(1, Ordering::Relaxed);
        *self.last_fault.lock() = Some(fault.to_string());
    }

    pub fn record_command(&self, name: &str) {
        self.command_calls.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("herald_commands_total", "command" => name.to_string()).increment(1);
    }

    pub fn faults(&self) -> u64 {
        self.faults.load(Ordering::Relaxed)
    }

    pub fn command_calls(&self) -> u64 {
        self.command_calls.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> Duration {
        self.started.lock().elapsed()
    }

    /// Zeroes the counters and restarts the uptime clock.
    pub fn reset(&self) {
        self.faults.store(0, Ordering::Relaxed);
        self.command_calls.store(0, Ordering::Relaxed);
        *self.last_fault.lock() = None;
        *self.started.lock() = Instant::now();
    }

    /// Copies the current values into a persistable record.
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            id: self.id.clone(),
            created_unix_secs: self
                .created_at
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
            uptime_secs: self.uptime().as_secs(),
            faults: self.faults(),
            command_calls: self.command_calls(),
            last_fault: self.last_fault.lock().clone(),
        }
    }
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`Statistics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub id: String,
    pub created_unix_secs: u64,
    pub uptime_secs: u64,
    pub faults: u64,
    pub command_calls: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fault: Option<String>,
}

impl StatisticsSnapshot {
    /// Human-readable summary, one value per line.
    pub fn display_string(&self) -> String {
        let uptime = humantime::format_duration(Duration::from_secs(self.uptime_secs));
        let mut out = format!(
            "Uptime: {uptime}\nFaults: {}\nCommand calls: {}",
            self.faults, self.command_calls
        );
        if let Some(fault) = &self.last_fault {
            out.push_str("\nLast fault: ");
            out.push_str(fault);
        }
        out
    }
}

impl Entity for StatisticsSnapshot {
    fn object_id(&self) -> &str {
        &self.id
    }
}

/// Logs each fault and counts it in [`Statistics`].
#[derive(Debug, Clone)]
pub struct StatsFaultHandler {
    stats: Arc<Statistics>,
}

impl StatsFaultHandler {
    pub fn new(stats: Arc<Statistics>) -> Self {
        Self { stats }
    }
}

impl FaultHandler for StatsFaultHandler {
    fn on_fault(&self, fault: &WatchError) {
        error!(error = %fault, terminal = fault.is_terminal(), "Caught fault");
        self.stats.record_fault(fault);
    }
}
