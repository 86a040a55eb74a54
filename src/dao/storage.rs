use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend could not be reached or rejected the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human readable summary of the failure.
        message: String,
        /// Backend specific cause.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A record with the same identifier already exists.
    #[error("record `{id}` already exists")]
    DuplicateKey {
        /// Identifier that collided.
        id: String,
    },
    /// A stored record could not be decoded into the current schema.
    #[error("record `{id}` is corrupted: {reason}")]
    Corrupted {
        /// Identifier of the unreadable record.
        id: String,
        /// Why decoding failed.
        reason: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a corruption error for the record `id`.
    pub fn corrupted(id: impl Into<String>, reason: impl Into<String>) -> Self {
        StorageError::Corrupted {
            id: id.into(),
            reason: reason.into(),
        }
    }
}
