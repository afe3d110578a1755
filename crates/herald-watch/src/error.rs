//! Faults observed by watchers and the notification queue.

/// A fault caught at an isolation boundary.
///
/// Faults are never propagated to the loop that produced them; they are
/// handed to a [`FaultHandler`](crate::FaultHandler) instead.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// A watcher action returned an error.
    #[error("watcher '{watcher}' action failed: {source}")]
    Action {
        watcher: String,
        #[source]
        source: anyhow::Error,
    },

    /// Code running inside an isolation boundary panicked.
    #[error("'{scope}' panicked: {message}")]
    Panicked { scope: String, message: String },

    /// The watcher's own machinery failed; the affected run is terminated.
    #[error("watcher '{watcher}' infrastructure failure: {reason}")]
    Infrastructure { watcher: String, reason: String },

    /// Delivering a notification chunk failed.
    #[error("delivery to channel {channel_id} failed: {source}")]
    Delivery {
        channel_id: u64,
        #[source]
        source: anyhow::Error,
    },
}

impl WatchError {
    /// Creates a new action error.
    pub fn action(watcher: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Action {
            watcher: watcher.into(),
            source,
        }
    }

    /// Creates a new panic error.
    pub fn panicked(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Panicked {
            scope: scope.into(),
            message: message.into(),
        }
    }

    /// Creates a new infrastructure error.
    pub fn infrastructure(watcher: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Infrastructure {
            watcher: watcher.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new delivery error.
    pub fn delivery(channel_id: u64, source: anyhow::Error) -> Self {
        Self::Delivery { channel_id, source }
    }

    /// Returns true if the fault ended a watcher run rather than one tick.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Infrastructure { .. })
    }
}
