//! Error types for backing stores.
//!
//! Absence is never an error in Herald: a missing key, an unregistered
//! entity type or an empty bucket are all reported through empty results.
//! `SourceError` is reserved for genuine failures of the backing store and
//! is returned to the caller unmodified by the repository.

/// Errors raised by a [`DataSource`](crate::DataSource) implementation.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The backing store cannot be reached right now.
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    /// The store refused the operation for the given entity.
    #[error("store rejected {entity} '{id}': {reason}")]
    Rejected {
        /// Entity type name.
        entity: String,
        /// Identifier of the rejected item.
        id: String,
        /// Why the store refused it.
        reason: String,
    },

    /// An I/O error occurred inside the store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other store failure.
    #[error("internal store error: {0}")]
    Internal(String),
}

impl SourceError {
    /// Creates a new unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Creates a new rejection error.
    pub fn rejected(
        entity: impl Into<String>,
        id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Rejected {
            entity: entity.into(),
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this is a transient error that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Io(_))
    }
}

/// Result alias for store operations.
pub type SourceResult<T> = std::result::Result<T, SourceError>;
