//! Error types for gear-sync

use gear_order::{Scope, ValidationError};

use crate::persistence::PersistenceError;

/// Result type for gear-sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the reorder coordinator
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The move or lifecycle request was rejected before anything was applied
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A persistence call failed after the optimistic apply.
    ///
    /// `reconciled` reports whether the affected scopes were re-read from the
    /// store afterwards. When it is `false` the local view may diverge until
    /// the next successful refresh.
    #[error("Persistence failed ({source}); reconciled: {reconciled}")]
    Persistence {
        #[source]
        source: PersistenceError,
        reconciled: bool,
    },

    /// Reconciliation returned data that contradicts the ordering invariants.
    /// The whole list has been re-read.
    #[error("Inconsistent data for {scope}: {reason}")]
    Consistency { scope: Scope, reason: String },

    /// Another operation holds the scope and the queue policy rejects waiting
    #[error("Scope {scope} is busy with another operation")]
    Busy { scope: Scope },

    /// Invalid coordinator settings
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl From<PersistenceError> for Error {
    fn from(source: PersistenceError) -> Self {
        Self::Persistence {
            source,
            reconciled: false,
        }
    }
}

impl Error {
    /// Whether the error was raised before any state was touched
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
