//! Periodic watchers and fault isolation.

mod context;
mod fault;
mod periodic;

pub use context::{WatcherConfig, WatcherContext, WatcherState};
pub use fault::{FaultHandler, LogFaultHandler, isolate};
pub use periodic::{PeriodicWatcher, WatcherAction};
