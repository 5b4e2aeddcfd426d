//! In-process store

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use gear_order::{
    Container, ContainerId, ContainerWrite, Entry, EntryId, EntryWrite, ListId, ListState,
};
use gear_sync::{
    ContainerPatch, EntryPatch, NewContainer, NewEntry, PersistResult, Persistence,
};

use crate::document::ListDocument;

/// Store keeping its records in memory. Batch writes are atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<ListDocument>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(document: ListDocument) -> Self {
        Self {
            document: Mutex::new(document),
        }
    }

    /// Store holding exactly the records of `state`
    pub fn from_state(state: &ListState) -> Self {
        Self::from_document(ListDocument::from_state(state, state.list_id().as_str()))
    }

    /// Copy of the stored records
    pub fn document(&self) -> ListDocument {
        self.lock().clone()
    }

    /// The list as a fresh fetch would see it
    pub fn list_state(&self, list_id: &ListId) -> crate::Result<ListState> {
        self.lock().list_state(list_id)
    }

    fn lock(&self) -> MutexGuard<'_, ListDocument> {
        self.document.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Persistence for MemoryStore {
    async fn update_entry(&self, id: &EntryId, patch: EntryPatch) -> PersistResult<()> {
        Ok(self.lock().update_entry(id, &patch)?)
    }

    async fn update_container(
        &self,
        id: &ContainerId,
        patch: ContainerPatch,
    ) -> PersistResult<()> {
        Ok(self.lock().update_container(id, &patch)?)
    }

    async fn fetch_entries(&self, container_id: &ContainerId) -> PersistResult<Vec<Entry>> {
        Ok(self.lock().entries_of(container_id)?)
    }

    async fn fetch_containers(&self, list_id: &ListId) -> PersistResult<Vec<Container>> {
        Ok(self.lock().containers_of(list_id)?)
    }

    async fn create_entry(&self, entry: NewEntry) -> PersistResult<Entry> {
        Ok(self.lock().insert_entry(entry)?)
    }

    async fn delete_entry(&self, id: &EntryId) -> PersistResult<()> {
        self.lock().remove_entry(id)?;
        Ok(())
    }

    async fn create_container(&self, container: NewContainer) -> PersistResult<Container> {
        Ok(self.lock().insert_container(container)?)
    }

    async fn delete_container(&self, id: &ContainerId) -> PersistResult<()> {
        self.lock().remove_container(id)?;
        Ok(())
    }

    fn supports_batch(&self) -> bool {
        true
    }

    async fn set_entry_positions(
        &self,
        container_id: &ContainerId,
        writes: &[EntryWrite],
    ) -> PersistResult<()> {
        Ok(self.lock().set_entry_positions(container_id, writes)?)
    }

    async fn set_container_positions(
        &self,
        list_id: &ListId,
        writes: &[ContainerWrite],
    ) -> PersistResult<()> {
        Ok(self.lock().set_container_positions(list_id, writes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gear_order::Payload;
    use gear_sync::PersistenceError;

    fn store() -> MemoryStore {
        let state = ListState::from_parts(
            "pct".into(),
            vec![Container::new("sleep", "pct", "Sleep", 0)],
            vec![Entry::new("bag", "sleep", 0), Entry::new("pad", "sleep", 1)],
        );
        MemoryStore::from_state(&state)
    }

    #[tokio::test]
    async fn fetch_returns_seeded_records() {
        let store = store();
        let entries = store.fetch_entries(&"sleep".into()).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(store.fetch_containers(&"pct".into()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_records_surface_as_not_found() {
        let store = store();
        let err = store
            .update_entry(&"tarp".into(), EntryPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PersistenceError::NotFound { .. }));

        let err = store.fetch_entries(&"cook".into()).await.unwrap_err();
        assert!(matches!(err, PersistenceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn created_entries_are_fetchable() {
        let store = store();
        let entry = store
            .create_entry(NewEntry {
                container_id: "sleep".into(),
                position: 2,
                payload: Payload::new(),
            })
            .await
            .unwrap();
        let entries = store.fetch_entries(&"sleep".into()).await.unwrap();
        assert_eq!(entries.last().map(|e| &e.id), Some(&entry.id));
    }

    #[tokio::test]
    async fn batch_writes_apply_together() {
        let store = store();
        assert!(store.supports_batch());
        store
            .set_entry_positions(
                &"sleep".into(),
                &[
                    EntryWrite::position("pad".into(), 0),
                    EntryWrite::position("bag".into(), 1),
                ],
            )
            .await
            .unwrap();
        let state = store.list_state(&"pct".into()).unwrap();
        let order: Vec<&str> = state
            .entries(&"sleep".into())
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(order, vec!["pad", "bag"]);
    }
}
