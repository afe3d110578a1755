//! Host start-up and shutdown errors.

use herald_core::SourceError;

/// Errors raised while building, starting or stopping the host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Settings could not be loaded or deserialized.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A settings value was readable but invalid.
    #[error("invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    /// The logging subscriber could not be installed.
    #[error("logging initialization failed: {0}")]
    Logging(String),

    /// The backing store failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Command registration failed.
    #[error(transparent)]
    Command(#[from] crate::commands::CommandError),
}

impl HostError {
    /// Creates a new invalid-setting error.
    pub fn invalid_setting(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandError;

    #[test]
    fn test_error_display() {
        let err = HostError::invalid_setting("queue.drain_interval", "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid setting 'queue.drain_interval': must be positive"
        );

        let err: HostError = SourceError::unavailable("disk full").into();
        assert_eq!(err.to_string(), "store unavailable: disk full");

        let err: HostError = CommandError::Duplicate("check".to_string()).into();
        assert_eq!(err.to_string(), "command name or alias registered twice: check");
    }
}
