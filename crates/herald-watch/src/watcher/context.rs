//! Watcher configuration and per-tick context.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Configuration for a periodic watcher.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Name used for the thread and in logs.
    pub name: String,
    /// Delay between the end of one tick and the start of the next.
    pub interval: Duration,
}

impl WatcherConfig {
    /// Creates a new configuration.
    pub fn new(name: impl Into<String>, interval: Duration) -> Self {
        Self {
            name: name.into(),
            interval,
        }
    }

    /// Sets the interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            name: "watcher".to_string(),
            interval: Duration::from_secs(60),
        }
    }
}

/// Lifecycle state of a watcher run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    /// No run is active.
    Idle,
    /// A run is active and has not been asked to stop.
    Running,
    /// Stop was requested; the previous run has not exited yet.
    Cancelling,
}

impl fmt::Display for WatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Cancelling => write!(f, "cancelling"),
        }
    }
}

/// Passed to the action on every invocation.
#[derive(Debug, Clone)]
pub struct WatcherContext {
    name: Arc<str>,
    tick: u64,
    cancel: Option<watch::Receiver<bool>>,
}

impl WatcherContext {
    pub(crate) fn new(name: Arc<str>, tick: u64, cancel: Option<watch::Receiver<bool>>) -> Self {
        Self { name, tick, cancel }
    }

    /// Returns the watcher name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the 1-based invocation number.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Returns true once the owning run has been asked to stop.
    ///
    /// Long actions can poll this to return early.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }
}
