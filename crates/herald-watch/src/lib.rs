//! # Herald Watch
//!
//! Background execution for Herald.
//!
//! - [`PeriodicWatcher`]: runs an action on a fixed interval on its own
//!   thread, with start/stop/dispose lifecycle and on-demand execution
//! - [`isolate`]: the fault boundary shared by ticks and deliveries; errors
//!   and panics become [`WatchError`]s handed to a [`FaultHandler`]
//! - [`NotificationQueue`]: a FIFO of notifications drained by a watcher,
//!   chunked by a [`MessageFormatter`] and sent through a [`MessageSender`]
//!
//! ## Example
//!
//! ```
//! use std::time::Duration;
//! use herald_watch::{PeriodicWatcher, WatcherConfig};
//!
//! let watcher = PeriodicWatcher::with_log_faults(
//!     WatcherConfig::new("heartbeat", Duration::from_secs(30)),
//!     |ctx| {
//!         tracing::debug!(tick = ctx.tick(), "alive");
//!         Ok(())
//!     },
//! );
//!
//! assert!(watcher.execute_procedure());
//! watcher.dispose();
//! ```

pub mod error;
pub mod notify;
pub mod watcher;

pub use error::WatchError;
pub use notify::{
    ChannelId, ChunkingFormatter, DEFAULT_MAX_MESSAGE_LENGTH, DrainReport, MessageFormatter,
    MessageSender, NotificationContext, NotificationQueue, QueueConfig,
};
pub use watcher::{
    FaultHandler, LogFaultHandler, PeriodicWatcher, WatcherAction, WatcherConfig, WatcherContext,
    WatcherState, isolate,
};
