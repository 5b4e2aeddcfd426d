//! Error types for gear-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from gear-sync
    #[error(transparent)]
    Sync(#[from] gear_sync::Error),

    /// Error from gear-store
    #[error(transparent)]
    Store(#[from] gear_store::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}

impl From<gear_order::ValidationError> for CliError {
    fn from(err: gear_order::ValidationError) -> Self {
        Self::Sync(err.into())
    }
}
