//! Persistence interface the coordinator writes through

use std::time::Duration;

use async_trait::async_trait;
use gear_order::{
    Container, ContainerId, ContainerWrite, Entry, EntryId, EntryWrite, ListId, Payload,
};
use serde::{Deserialize, Serialize};

/// Result type for persistence calls
pub type PersistResult<T> = std::result::Result<T, PersistenceError>;

/// Failure of a single persistence call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    /// The backend could not be reached
    #[error("Persistence backend unavailable: {message}")]
    Unavailable { message: String },

    /// The addressed record does not exist
    #[error("Record not found: {what}")]
    NotFound { what: String },

    /// The backend refused the write
    #[error("Write rejected: {message}")]
    Rejected { message: String },

    /// The call did not complete in time
    #[error("Persistence call timed out after {after:?}")]
    Timeout { after: Duration },
}

impl PersistenceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}

/// Partial update of an entry record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<ContainerId>,
}

impl From<&EntryWrite> for EntryPatch {
    fn from(write: &EntryWrite) -> Self {
        Self {
            position: Some(write.position),
            container_id: write.container.clone(),
        }
    }
}

/// Partial update of a container record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ContainerPatch {
    pub fn position(position: usize) -> Self {
        Self {
            position: Some(position),
            title: None,
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            position: None,
            title: Some(title.into()),
        }
    }
}

/// Entry to be created; the store assigns the id
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub container_id: ContainerId,
    pub position: usize,
    pub payload: Payload,
}

/// Container to be created; the store assigns the id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContainer {
    pub list_id: ListId,
    pub title: String,
    pub position: usize,
}

/// Record store holding containers and entries.
///
/// Fetches return records ordered by `(position, id)`. Implementations that
/// can write a whole sequence in one call override the batch methods and
/// return `true` from [`Persistence::supports_batch`]; the defaults fall back
/// to one call per record.
#[async_trait]
pub trait Persistence: Send + Sync {
    async fn update_entry(&self, id: &EntryId, patch: EntryPatch) -> PersistResult<()>;

    async fn update_container(&self, id: &ContainerId, patch: ContainerPatch)
    -> PersistResult<()>;

    async fn fetch_entries(&self, container_id: &ContainerId) -> PersistResult<Vec<Entry>>;

    async fn fetch_containers(&self, list_id: &ListId) -> PersistResult<Vec<Container>>;

    async fn create_entry(&self, entry: NewEntry) -> PersistResult<Entry>;

    async fn delete_entry(&self, id: &EntryId) -> PersistResult<()>;

    async fn create_container(&self, container: NewContainer) -> PersistResult<Container>;

    /// Delete a container together with its entries
    async fn delete_container(&self, id: &ContainerId) -> PersistResult<()>;

    fn supports_batch(&self) -> bool {
        false
    }

    /// Write several entry positions of one container
    async fn set_entry_positions(
        &self,
        container_id: &ContainerId,
        writes: &[EntryWrite],
    ) -> PersistResult<()> {
        tracing::trace!(container = %container_id, count = writes.len(), "Batch fallback");
        for write in writes {
            self.update_entry(&write.id, EntryPatch::from(write)).await?;
        }
        Ok(())
    }

    /// Write several container positions of one list
    async fn set_container_positions(
        &self,
        list_id: &ListId,
        writes: &[ContainerWrite],
    ) -> PersistResult<()> {
        tracing::trace!(list = %list_id, count = writes.len(), "Batch fallback");
        for write in writes {
            self.update_container(&write.id, ContainerPatch::position(write.position))
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_from_relocating_write_carries_container() {
        let write = EntryWrite::relocate(EntryId::from("stove"), 2, ContainerId::from("kitchen"));
        let patch = EntryPatch::from(&write);
        assert_eq!(patch.position, Some(2));
        assert_eq!(patch.container_id, Some(ContainerId::from("kitchen")));
    }

    #[test]
    fn patch_from_plain_write_keeps_container() {
        let patch = EntryPatch::from(&EntryWrite::position(EntryId::from("stove"), 0));
        assert_eq!(patch.container_id, None);
    }

    #[test]
    fn patch_serialization_skips_unset_fields() {
        let json = serde_json::to_string(&ContainerPatch::title("Sleep")).unwrap();
        assert_eq!(json, r#"{"title":"Sleep"}"#);
    }
}
