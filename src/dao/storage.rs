use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying medium.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    #[error("stored board `{id}` is malformed: {message}")]
    Malformed {
        id: String,
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
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

    /// Construct a malformed-board error from a decode failure.
    pub fn malformed(
        id: impl Into<String>,
        message: String,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        StorageError::Malformed {
            id: id.into(),
            message,
            source: Box::new(source),
        }
    }
}
