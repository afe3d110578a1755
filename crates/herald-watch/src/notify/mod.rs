//! Notification queueing, formatting and delivery.

mod format;
mod message;
mod queue;

pub use format::{ChunkingFormatter, DEFAULT_MAX_MESSAGE_LENGTH, MessageFormatter};
pub use message::{ChannelId, MessageSender, NotificationContext};
pub use queue::{DrainReport, NotificationQueue, QueueConfig};
