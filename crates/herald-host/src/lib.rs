//! # Herald Host
//!
//! Wires the Herald building blocks into a running process.
//!
//! - [`Settings`]: layered configuration (defaults, file, environment)
//! - [`Statistics`]: fault and command counters shared by every component
//! - [`CommandRegistry`]: prefix-parsed text commands, built once
//! - [`FeedWatcher`]: polls a [`ContentProvider`] and notifies subscribers
//! - [`Host`]: composition root with `start` and `shutdown`

pub mod commands;
pub mod error;
pub mod feed;
pub mod host;
pub mod logging;
pub mod sender;
pub mod settings;
pub mod stats;

pub use commands::{CommandContext, CommandError, CommandRegistry, CommandSpec};
pub use error::{HostError, HostResult};
pub use feed::{
    ContentProvider, EmptyProvider, FeedEntry, FeedWatcher, HostRepository, JsonFileProvider,
    Subscription,
};
pub use host::Host;
pub use sender::LogSender;
pub use settings::Settings;
pub use stats::{Statistics, StatisticsSnapshot, StatsFaultHandler};
