//! Notification payloads and the delivery contract.

use serde::{Deserialize, Serialize};

/// Identifier of a delivery channel.
pub type ChannelId = u64;

/// One queued notification: a target channel and the full message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContext {
    pub channel_id: ChannelId,
    pub message: String,
}

impl NotificationContext {
    pub fn new(channel_id: ChannelId, message: impl Into<String>) -> Self {
        Self {
            channel_id,
            message: message.into(),
        }
    }
}

/// Delivers formatted chunks to channels.
///
/// `resolve` answers whether a channel currently exists; unresolvable
/// notifications are dropped without calling `deliver`.
pub trait MessageSender: Send + Sync {
    /// Returns true if the channel can receive messages.
    fn resolve(&self, channel_id: ChannelId) -> bool;

    /// Sends one chunk to the channel.
    fn deliver(&self, channel_id: ChannelId, text: &str) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_serde() {
        let ctx = NotificationContext::new(42, "New post");
        let json = serde_json::to_string(&ctx).unwrap();
        assert_eq!(json, r#"{"channel_id":42,"message":"New post"}"#);

        let back: NotificationContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ctx);
    }
}
