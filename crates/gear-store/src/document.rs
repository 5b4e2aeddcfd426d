//! The stored record set shared by both stores

use chrono::{DateTime, Utc};
use gear_order::{
    Container, ContainerId, ContainerWrite, Entry, EntryId, EntryWrite, ListId, ListState,
    sort_by_position,
};
use gear_sync::{ContainerPatch, EntryPatch, NewContainer, NewEntry};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Current on-disk format version
pub const FORMAT_VERSION: u32 = 1;

/// A gear list as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRecord {
    pub id: ListId,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Every list, container and entry of a store.
///
/// Records are kept flat, the way a relational backend would hold them;
/// ordering comes from the `position` columns only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListDocument {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub lists: Vec<ListRecord>,
    #[serde(default)]
    pub containers: Vec<Container>,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl Default for ListDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl ListDocument {
    pub fn new() -> Self {
        Self {
            version: FORMAT_VERSION,
            saved_at: Utc::now(),
            lists: Vec::new(),
            containers: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Seed a document with the records of a local view
    pub fn from_state(state: &ListState, title: impl Into<String>) -> Self {
        let mut document = Self::new();
        document.lists.push(ListRecord {
            id: state.list_id().clone(),
            title: title.into(),
            created_at: document.saved_at,
        });
        document.containers = state.containers().to_vec();
        for container in state.containers() {
            document
                .entries
                .extend(state.entries(&container.id).iter().cloned());
        }
        document
    }

    pub fn check_version(&self) -> Result<()> {
        if self.version != FORMAT_VERSION {
            return Err(Error::UnsupportedVersion {
                found: self.version,
                expected: FORMAT_VERSION,
            });
        }
        Ok(())
    }

    pub fn add_list(&mut self, title: impl Into<String>) -> ListRecord {
        let record = ListRecord {
            id: ListId::new(Uuid::new_v4().to_string()),
            title: title.into(),
            created_at: Utc::now(),
        };
        self.lists.push(record.clone());
        record
    }

    pub fn list(&self, id: &ListId) -> Option<&ListRecord> {
        self.lists.iter().find(|l| &l.id == id)
    }

    /// Build the local view of one list as a fresh fetch would
    pub fn list_state(&self, id: &ListId) -> Result<ListState> {
        let containers = self.containers_of(id)?;
        let entries = self
            .entries
            .iter()
            .filter(|e| containers.iter().any(|c| c.id == e.container_id))
            .cloned()
            .collect::<Vec<_>>();
        Ok(ListState::from_parts(id.clone(), containers, entries))
    }

    /// Containers of a list ordered by `(position, id)`
    pub fn containers_of(&self, list_id: &ListId) -> Result<Vec<Container>> {
        if self.list(list_id).is_none() {
            return Err(Error::not_found("list", list_id));
        }
        let mut containers: Vec<Container> = self
            .containers
            .iter()
            .filter(|c| &c.list_id == list_id)
            .cloned()
            .collect();
        sort_by_position(&mut containers);
        Ok(containers)
    }

    /// Entries of a container ordered by `(position, id)`
    pub fn entries_of(&self, container_id: &ContainerId) -> Result<Vec<Entry>> {
        self.container_index(container_id)?;
        let mut entries: Vec<Entry> = self
            .entries
            .iter()
            .filter(|e| &e.container_id == container_id)
            .cloned()
            .collect();
        sort_by_position(&mut entries);
        Ok(entries)
    }

    pub fn update_entry(&mut self, id: &EntryId, patch: &EntryPatch) -> Result<()> {
        if let Some(container_id) = &patch.container_id {
            self.container_index(container_id)?;
        }
        let index = self.entry_index(id)?;
        let entry = &mut self.entries[index];
        if let Some(position) = patch.position {
            entry.position = position;
        }
        if let Some(container_id) = &patch.container_id {
            entry.container_id = container_id.clone();
        }
        Ok(())
    }

    pub fn update_container(&mut self, id: &ContainerId, patch: &ContainerPatch) -> Result<()> {
        let index = self.container_index(id)?;
        let container = &mut self.containers[index];
        if let Some(position) = patch.position {
            container.position = position;
        }
        if let Some(title) = &patch.title {
            container.title = title.clone();
        }
        Ok(())
    }

    pub fn insert_entry(&mut self, new: NewEntry) -> Result<Entry> {
        self.container_index(&new.container_id)?;
        let entry = Entry::new(
            EntryId::new(Uuid::new_v4().to_string()),
            new.container_id,
            new.position,
        )
        .with_payload(new.payload);
        self.entries.push(entry.clone());
        Ok(entry)
    }

    pub fn remove_entry(&mut self, id: &EntryId) -> Result<Entry> {
        let index = self.entry_index(id)?;
        Ok(self.entries.remove(index))
    }

    pub fn insert_container(&mut self, new: NewContainer) -> Result<Container> {
        if self.list(&new.list_id).is_none() {
            return Err(Error::not_found("list", &new.list_id));
        }
        let container = Container::new(
            ContainerId::new(Uuid::new_v4().to_string()),
            new.list_id,
            new.title,
            new.position,
        );
        self.containers.push(container.clone());
        Ok(container)
    }

    /// Remove a container and every entry it holds, returning the number of
    /// entries removed with it
    pub fn remove_container(&mut self, id: &ContainerId) -> Result<usize> {
        let index = self.container_index(id)?;
        self.containers.remove(index);
        let before = self.entries.len();
        self.entries.retain(|e| &e.container_id != id);
        Ok(before - self.entries.len())
    }

    /// Apply several entry writes at once; nothing changes unless every
    /// addressed record exists
    pub fn set_entry_positions(
        &mut self,
        container_id: &ContainerId,
        writes: &[EntryWrite],
    ) -> Result<()> {
        self.container_index(container_id)?;
        let mut indices = Vec::with_capacity(writes.len());
        for write in writes {
            if let Some(target) = &write.container {
                self.container_index(target)?;
            }
            indices.push(self.entry_index(&write.id)?);
        }
        for (index, write) in indices.into_iter().zip(writes) {
            let entry = &mut self.entries[index];
            entry.position = write.position;
            if let Some(target) = &write.container {
                entry.container_id = target.clone();
            }
        }
        Ok(())
    }

    /// Apply several container writes at once; nothing changes unless every
    /// addressed record exists
    pub fn set_container_positions(
        &mut self,
        list_id: &ListId,
        writes: &[ContainerWrite],
    ) -> Result<()> {
        if self.list(list_id).is_none() {
            return Err(Error::not_found("list", list_id));
        }
        let indices = writes
            .iter()
            .map(|w| self.container_index(&w.id))
            .collect::<Result<Vec<_>>>()?;
        for (index, write) in indices.into_iter().zip(writes) {
            self.containers[index].position = write.position;
        }
        Ok(())
    }

    fn entry_index(&self, id: &EntryId) -> Result<usize> {
        self.entries
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| Error::not_found("entry", id))
    }

    fn container_index(&self, id: &ContainerId) -> Result<usize> {
        self.containers
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| Error::not_found("container", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gear_order::Payload;
    use pretty_assertions::assert_eq;

    fn document() -> ListDocument {
        let state = ListState::from_parts(
            "pct".into(),
            vec![
                Container::new("sleep", "pct", "Sleep", 0),
                Container::new("cook", "pct", "Cook", 1),
            ],
            vec![
                Entry::new("bag", "sleep", 0),
                Entry::new("pad", "sleep", 1),
                Entry::new("stove", "cook", 0),
            ],
        );
        ListDocument::from_state(&state, "PCT 2026")
    }

    fn ids(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn round_trips_a_local_view() {
        let doc = document();
        let state = doc.list_state(&"pct".into()).unwrap();
        assert_eq!(state.containers().len(), 2);
        assert_eq!(ids(state.entries(&"sleep".into())), vec!["bag", "pad"]);
        assert!(state.is_valid());
    }

    #[test]
    fn fetches_are_ordered_by_position_then_id() {
        let mut doc = document();
        doc.update_entry(&"pad".into(), &EntryPatch { position: Some(0), container_id: None })
            .unwrap();
        let entries = doc.entries_of(&"sleep".into()).unwrap();
        assert_eq!(ids(&entries), vec!["bag", "pad"]);
    }

    #[test]
    fn relocating_patch_changes_container() {
        let mut doc = document();
        doc.update_entry(
            &"bag".into(),
            &EntryPatch {
                position: Some(1),
                container_id: Some("cook".into()),
            },
        )
        .unwrap();
        assert_eq!(ids(&doc.entries_of(&"cook".into()).unwrap()), vec!["stove", "bag"]);
    }

    #[test]
    fn patch_into_unknown_container_fails() {
        let mut doc = document();
        let err = doc
            .update_entry(
                &"bag".into(),
                &EntryPatch {
                    position: Some(0),
                    container_id: Some("shelter".into()),
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "container", .. }));
    }

    #[test]
    fn container_removal_cascades() {
        let mut doc = document();
        assert_eq!(doc.remove_container(&"sleep".into()).unwrap(), 2);
        assert_eq!(doc.entries.len(), 1);
        assert!(doc.entries_of(&"sleep".into()).is_err());
    }

    #[test]
    fn inserted_records_get_fresh_ids() {
        let mut doc = document();
        let a = doc
            .insert_entry(NewEntry {
                container_id: "cook".into(),
                position: 1,
                payload: Payload::new(),
            })
            .unwrap();
        let b = doc
            .insert_entry(NewEntry {
                container_id: "cook".into(),
                position: 2,
                payload: Payload::new(),
            })
            .unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(doc.entries_of(&"cook".into()).unwrap().len(), 3);
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let mut doc = document();
        let before = doc.clone();
        let err = doc
            .set_entry_positions(
                &"sleep".into(),
                &[
                    EntryWrite::position("pad".into(), 0),
                    EntryWrite::position("ghost".into(), 1),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "entry", .. }));
        assert_eq!(doc, before);
    }

    #[test]
    fn container_batch_rewrites_positions() {
        let mut doc = document();
        doc.set_container_positions(
            &"pct".into(),
            &[
                ContainerWrite {
                    id: "cook".into(),
                    position: 0,
                },
                ContainerWrite {
                    id: "sleep".into(),
                    position: 1,
                },
            ],
        )
        .unwrap();
        let order: Vec<String> = doc
            .containers_of(&"pct".into())
            .unwrap()
            .into_iter()
            .map(|c| c.id.to_string())
            .collect();
        assert_eq!(order, vec!["cook", "sleep"]);
    }

    #[test]
    fn rejects_future_versions() {
        let mut doc = document();
        doc.version = FORMAT_VERSION + 1;
        assert!(matches!(doc.check_version(), Err(Error::UnsupportedVersion { .. })));
    }
}
