//! Feed entities stored through the repository.

use herald_core::Entity;
use herald_watch::ChannelId;
use serde::{Deserialize, Serialize};

/// A channel's subscription to a named feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    id: String,
    pub channel_id: ChannelId,
    pub source: String,
}

impl Subscription {
    pub fn new(channel_id: ChannelId, source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            id: Self::key(channel_id, &source),
            channel_id,
            source,
        }
    }

    /// Object id of the subscription of `channel_id` to `source`.
    pub fn key(channel_id: ChannelId, source: &str) -> String {
        format!("{source}:{channel_id}")
    }
}

impl Entity for Subscription {
    fn object_id(&self) -> &str {
        &self.id
    }
}

/// One published feed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub id: String,
    pub title: String,
    pub link: String,
}

impl FeedEntry {
    pub fn new(id: impl Into<String>, title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            link: link.into(),
        }
    }
}

impl Entity for FeedEntry {
    fn object_id(&self) -> &str {
        &self.id
    }
}
