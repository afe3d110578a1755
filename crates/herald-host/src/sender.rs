//! Delivery to the process log.

use herald_watch::{ChannelId, MessageSender};
use tracing::info;

/// Sender that writes every chunk to the log. Every channel resolves.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSender;

impl MessageSender for LogSender {
    fn resolve(&self, _channel_id: ChannelId) -> bool {
        true
    }

    fn deliver(&self, channel_id: ChannelId, text: &str) -> anyhow::Result<()> {
        info!(channel_id, "{}", text);
        Ok(())
    }
}
