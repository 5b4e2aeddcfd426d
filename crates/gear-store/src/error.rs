//! Error types for gear-store

use std::path::PathBuf;

use gear_sync::PersistenceError;

/// Result type for gear-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the stores
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A list, container or entry is not in the document
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The list file does not exist
    #[error("List file not found at {path}")]
    MissingFile { path: PathBuf },

    /// The list file already exists
    #[error("List file already exists at {path}")]
    AlreadyExists { path: PathBuf },

    /// The list file was written by an incompatible version
    #[error("Unsupported document version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The blocking task doing the file I/O panicked or was cancelled
    #[error("File worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl Error {
    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<Error> for PersistenceError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound { .. } => PersistenceError::not_found(err.to_string()),
            Error::AlreadyExists { .. } => PersistenceError::rejected(err.to_string()),
            other => PersistenceError::unavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_not_found() {
        let err: PersistenceError = Error::not_found("container", "tents").into();
        assert_eq!(err, PersistenceError::not_found("container not found: tents"));
    }

    #[test]
    fn io_maps_to_unavailable() {
        let err: PersistenceError =
            Error::Io(std::io::Error::other("disk gone")).into();
        assert!(matches!(err, PersistenceError::Unavailable { message } if message.contains("disk gone")));
    }
}
