//! Error types for gear-order

use crate::model::{ContainerId, EntryId, ListId};

/// Result type for planning operations
pub type Result<T> = std::result::Result<T, ValidationError>;

/// A move or lifecycle request that cannot be planned against the current state.
///
/// Validation always happens before any state is touched, so a caller that
/// receives one of these can be sure nothing was mutated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The container is not part of the list
    #[error("Unknown container: {id}")]
    UnknownContainer { id: ContainerId },

    /// The entry is not part of any container of the list
    #[error("Unknown entry: {id}")]
    UnknownEntry { id: EntryId },

    /// The entry exists but lives in a different container than the intent claims
    #[error("Entry {entry} is not in container {container}")]
    EntryNotInContainer { entry: EntryId, container: ContainerId },

    /// The intent was built from an outdated view of the sequence
    #[error("Stale index for {id}: intent says {stated}, current index is {actual}")]
    StaleIndex {
        id: String,
        stated: usize,
        actual: usize,
    },

    /// Transfers must cross containers; same-container moves are reorders
    #[error("Transfer source and destination are both {container}")]
    SameContainerTransfer { container: ContainerId },

    /// The container belongs to another list
    #[error("Container {container} belongs to list {found}, expected {expected}")]
    ForeignContainer {
        container: ContainerId,
        expected: ListId,
        found: ListId,
    },

    /// Container titles must contain something besides whitespace
    #[error("Container title cannot be empty")]
    EmptyTitle,

    /// A 1-based position selection was zero
    #[error("Position {position} is out of range (positions start at 1)")]
    PositionOutOfRange { position: usize },
}
