//! Feed subscriptions: poll a content provider, notify subscribed channels.

mod entities;
mod provider;
mod watcher;

pub use entities::{FeedEntry, Subscription};
pub use provider::{ContentProvider, EmptyProvider, JsonFileProvider};
pub use watcher::{FeedWatcher, HostRepository};
