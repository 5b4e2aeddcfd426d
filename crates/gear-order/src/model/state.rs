//! Local list state
//!
//! `ListState` is the in-memory, position-indexed view of one gear list: the
//! ordered container sequence and, per container, the ordered entry sequence.

use super::{
    Container, ContainerId, Entry, EntryId, ListId, ScopeUpdate, is_contiguous, sort_by_position,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A broken ordering invariant found by [`ListState::check_invariants`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// Container positions are not exactly `0..n`
    #[error("Container positions of list {list_id} are not contiguous: {found:?}")]
    ContainerPositions { list_id: ListId, found: Vec<usize> },

    /// Entry positions of one container are not exactly `0..m`
    #[error("Entry positions of container {container_id} are not contiguous: {found:?}")]
    EntryPositions {
        container_id: ContainerId,
        found: Vec<usize>,
    },

    /// A container claims a different parent list
    #[error("Container {container_id} belongs to list {found}, expected {expected}")]
    ForeignContainer {
        container_id: ContainerId,
        expected: ListId,
        found: ListId,
    },

    /// Entries are filed under a container that is not in the list
    #[error("Entry {entry_id} references missing container {container_id}")]
    OrphanEntry {
        entry_id: EntryId,
        container_id: ContainerId,
    },

    /// An entry sits in one container's sequence but points at another
    #[error("Entry {entry_id} is filed under {filed_under} but references {container_id}")]
    MisfiledEntry {
        entry_id: EntryId,
        filed_under: ContainerId,
        container_id: ContainerId,
    },
}

/// Ordered containers and entries of a single list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListState {
    list_id: ListId,
    containers: Vec<Container>,
    entries: HashMap<ContainerId, Vec<Entry>>,
}

impl ListState {
    /// An empty list
    pub fn new(list_id: ListId) -> Self {
        Self {
            list_id,
            containers: Vec::new(),
            entries: HashMap::new(),
        }
    }

    /// Build a state from unordered records.
    ///
    /// Containers and each entry group are sorted by `(position, id)`, the same
    /// order a persistence layer returns for `ORDER BY position, id`. Positions
    /// are kept as stored so that gaps or duplicates stay visible.
    pub fn from_parts(
        list_id: ListId,
        containers: Vec<Container>,
        entries: impl IntoIterator<Item = Entry>,
    ) -> Self {
        let mut state = Self::new(list_id);
        state.replace_containers(containers);
        for entry in entries {
            state
                .entries
                .entry(entry.container_id.clone())
                .or_default()
                .push(entry);
        }
        for group in state.entries.values_mut() {
            sort_by_position(group);
        }
        state
    }

    pub fn list_id(&self) -> &ListId {
        &self.list_id
    }

    /// Containers in display order
    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    pub fn container(&self, id: &ContainerId) -> Option<&Container> {
        self.containers.iter().find(|c| &c.id == id)
    }

    pub fn container_index(&self, id: &ContainerId) -> Option<usize> {
        self.containers.iter().position(|c| &c.id == id)
    }

    pub fn has_container(&self, id: &ContainerId) -> bool {
        self.container_index(id).is_some()
    }

    /// Entries of a container in display order (empty for unknown containers)
    pub fn entries(&self, container_id: &ContainerId) -> &[Entry] {
        self.entries
            .get(container_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn entry_index(&self, container_id: &ContainerId, entry_id: &EntryId) -> Option<usize> {
        self.entries(container_id)
            .iter()
            .position(|e| &e.id == entry_id)
    }

    /// Find the container and index holding an entry
    pub fn locate_entry(&self, entry_id: &EntryId) -> Option<(&ContainerId, usize)> {
        self.containers.iter().find_map(|container| {
            self.entry_index(&container.id, entry_id)
                .map(|index| (&container.id, index))
        })
    }

    pub fn entry(&self, entry_id: &EntryId) -> Option<&Entry> {
        let (container_id, index) = self.locate_entry(entry_id)?;
        self.entries(container_id).get(index)
    }

    /// Total number of entries across all containers
    pub fn entry_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Replace the entry sequence of one container, keeping the given order
    pub fn replace_entries(&mut self, container_id: ContainerId, entries: Vec<Entry>) {
        self.entries.insert(container_id, entries);
    }

    /// Replace the container sequence.
    ///
    /// Containers are sorted by `(position, id)`; every container gets an
    /// (initially empty) entry sequence if it had none.
    pub fn replace_containers(&mut self, mut containers: Vec<Container>) {
        sort_by_position(&mut containers);
        for container in &containers {
            self.entries.entry(container.id.clone()).or_default();
        }
        self.containers = containers;
    }

    /// Forget the entry sequence of a container
    pub fn drop_entries(&mut self, container_id: &ContainerId) -> Option<Vec<Entry>> {
        self.entries.remove(container_id)
    }

    /// Set a container's title in place
    pub fn set_container_title(&mut self, id: &ContainerId, title: impl Into<String>) -> bool {
        match self.containers.iter_mut().find(|c| &c.id == id) {
            Some(container) => {
                container.title = title.into();
                true
            }
            None => false,
        }
    }

    /// Apply scope replacements in order
    pub fn apply(&mut self, updates: impl IntoIterator<Item = ScopeUpdate>) {
        for update in updates {
            match update {
                ScopeUpdate::Containers(containers) => self.replace_containers(containers),
                ScopeUpdate::Entries {
                    container_id,
                    entries,
                } => self.replace_entries(container_id, entries),
                ScopeUpdate::DropEntries(container_id) => {
                    self.drop_entries(&container_id);
                }
            }
        }
    }

    /// Containers that hold entries locally but are absent from the container
    /// sequence
    pub fn orphaned_groups(&self) -> Vec<&ContainerId> {
        let mut orphaned: Vec<&ContainerId> = self
            .entries
            .iter()
            .filter(|(id, group)| !group.is_empty() && !self.has_container(id))
            .map(|(id, _)| id)
            .collect();
        orphaned.sort();
        orphaned
    }

    /// Collect every violated ordering invariant. An empty result means the
    /// state is fully contiguous and consistent.
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();

        if !is_contiguous(&self.containers) {
            violations.push(InvariantViolation::ContainerPositions {
                list_id: self.list_id.clone(),
                found: self.containers.iter().map(|c| c.position).collect(),
            });
        }

        for container in &self.containers {
            if container.list_id != self.list_id {
                violations.push(InvariantViolation::ForeignContainer {
                    container_id: container.id.clone(),
                    expected: self.list_id.clone(),
                    found: container.list_id.clone(),
                });
            }

            let group = self.entries(&container.id);
            if !is_contiguous(group) {
                violations.push(InvariantViolation::EntryPositions {
                    container_id: container.id.clone(),
                    found: group.iter().map(|e| e.position).collect(),
                });
            }
            for entry in group {
                if entry.container_id != container.id {
                    violations.push(InvariantViolation::MisfiledEntry {
                        entry_id: entry.id.clone(),
                        filed_under: container.id.clone(),
                        container_id: entry.container_id.clone(),
                    });
                }
            }
        }

        for container_id in self.orphaned_groups() {
            for entry in self.entries(container_id) {
                violations.push(InvariantViolation::OrphanEntry {
                    entry_id: entry.id.clone(),
                    container_id: container_id.clone(),
                });
            }
        }

        violations
    }

    pub fn is_valid(&self) -> bool {
        self.check_invariants().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> ListState {
        ListState::from_parts(
            "l".into(),
            vec![
                Container::new("b", "l", "Cook", 1),
                Container::new("a", "l", "Sleep", 0),
            ],
            vec![
                Entry::new("a1", "a", 1),
                Entry::new("a0", "a", 0),
                Entry::new("b0", "b", 0),
            ],
        )
    }

    fn ids(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn from_parts_orders_by_position() {
        let state = sample();
        assert_eq!(state.containers()[0].id, ContainerId::from("a"));
        assert_eq!(ids(state.entries(&"a".into())), vec!["a0", "a1"]);
        assert!(state.is_valid());
    }

    #[test]
    fn from_parts_breaks_position_ties_by_id() {
        let state = ListState::from_parts(
            "l".into(),
            vec![Container::new("a", "l", "Sleep", 0)],
            vec![Entry::new("y", "a", 0), Entry::new("x", "a", 0)],
        );
        assert_eq!(ids(state.entries(&"a".into())), vec!["x", "y"]);
        assert_eq!(state.check_invariants().len(), 1);
    }

    #[test]
    fn locate_entry_finds_container_and_index() {
        let state = sample();
        let (container, index) = state.locate_entry(&"a1".into()).unwrap();
        assert_eq!(container, &ContainerId::from("a"));
        assert_eq!(index, 1);
        assert!(state.locate_entry(&"zz".into()).is_none());
    }

    #[test]
    fn empty_containers_get_empty_sequences() {
        let state = ListState::from_parts(
            "l".into(),
            vec![Container::new("empty", "l", "Misc", 0)],
            Vec::new(),
        );
        assert!(state.entries(&"empty".into()).is_empty());
        assert!(state.is_valid());
    }

    #[test]
    fn check_invariants_reports_gaps_and_orphans() {
        let state = ListState::from_parts(
            "l".into(),
            vec![Container::new("a", "l", "Sleep", 0)],
            vec![
                Entry::new("a0", "a", 0),
                Entry::new("a2", "a", 2),
                Entry::new("ghost", "gone", 0),
            ],
        );

        let violations = state.check_invariants();
        assert_eq!(
            violations,
            vec![
                InvariantViolation::EntryPositions {
                    container_id: "a".into(),
                    found: vec![0, 2],
                },
                InvariantViolation::OrphanEntry {
                    entry_id: "ghost".into(),
                    container_id: "gone".into(),
                },
            ]
        );
    }

    #[test]
    fn check_invariants_reports_foreign_and_misfiled() {
        let mut state = ListState::from_parts(
            "l".into(),
            vec![Container::new("a", "other", "Sleep", 0)],
            Vec::new(),
        );
        state.replace_entries("a".into(), vec![Entry::new("x", "b", 0)]);

        let violations = state.check_invariants();
        assert_eq!(violations.len(), 2);
        assert!(matches!(violations[0], InvariantViolation::ForeignContainer { .. }));
        assert!(matches!(violations[1], InvariantViolation::MisfiledEntry { .. }));
    }

    #[test]
    fn apply_replaces_and_drops_scopes() {
        let mut state = sample();
        state.apply([
            ScopeUpdate::Containers(vec![Container::new("a", "l", "Sleep", 0)]),
            ScopeUpdate::DropEntries("b".into()),
        ]);
        assert_eq!(state.containers().len(), 1);
        assert!(state.entries(&"b".into()).is_empty());
        assert!(state.is_valid());
    }

    #[test]
    fn round_trips_through_json() {
        let state = sample();
        let json = serde_json::to_string(&state).unwrap();
        let back: ListState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
