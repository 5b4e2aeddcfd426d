//! Diff calculator
//!
//! Given an old and a new ordering of the same records, produce only the writes
//! needed to make the stored positions match the new array order. Records whose
//! stored position already equals their new index are left out.

use crate::model::{ContainerId, Entry, EntryId, Positioned};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Set one record's position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionWrite<Id> {
    pub id: Id,
    pub position: usize,
}

/// Position write for a container within its list
pub type ContainerWrite = PositionWrite<ContainerId>;

/// Position write for an entry, optionally moving it to another container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryWrite {
    pub id: EntryId,
    pub position: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerId>,
}

impl EntryWrite {
    pub fn position(id: EntryId, position: usize) -> Self {
        Self {
            id,
            position,
            container: None,
        }
    }

    pub fn relocate(id: EntryId, position: usize, container: ContainerId) -> Self {
        Self {
            id,
            position,
            container: Some(container),
        }
    }
}

/// The entry whose container changes in a cross-container move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerChange {
    pub id: EntryId,
    pub to: ContainerId,
}

/// Writes turning `old` into `new` for a sequence without container changes.
///
/// The target position of every record is its index in `new`. Output follows
/// `new` in array order, so ties resolve towards the smaller index.
pub fn diff_positions<T: Positioned>(old: &[T], new: &[T]) -> Vec<PositionWrite<T::Id>> {
    let stored = stored_positions(old);
    new.iter()
        .enumerate()
        .filter(|(index, item)| stored.get(item.id()) != Some(index))
        .map(|(index, item)| PositionWrite {
            id: item.id().clone(),
            position: index,
        })
        .collect()
}

/// Writes turning `old` into `new` for an entry sequence.
///
/// With a `change`, the changed entry always yields a write carrying its new
/// container, even when its index happens to equal its old position. Entries
/// missing from `old` are written as well.
pub fn diff_entries(
    old: &[Entry],
    new: &[Entry],
    change: Option<&ContainerChange>,
) -> Vec<EntryWrite> {
    let stored = stored_positions(old);
    let mut writes = Vec::new();

    for (index, entry) in new.iter().enumerate() {
        match change {
            Some(change) if change.id == entry.id => {
                writes.push(EntryWrite::relocate(
                    entry.id.clone(),
                    index,
                    change.to.clone(),
                ));
            }
            _ if stored.get(&entry.id) != Some(&index) => {
                writes.push(EntryWrite::position(entry.id.clone(), index));
            }
            _ => {}
        }
    }

    writes
}

/// Apply position writes to `old` and return the sequence ordered by the
/// resulting positions. Records without a write keep their stored position.
pub fn apply_writes<'a, T, I>(old: &[T], writes: I) -> Vec<T>
where
    T: Positioned + Clone,
    T::Id: 'a,
    I: IntoIterator<Item = (&'a T::Id, usize)>,
{
    let targets: HashMap<&T::Id, usize> = writes.into_iter().collect();
    let mut result: Vec<T> = old
        .iter()
        .map(|item| {
            let mut item = item.clone();
            if let Some(position) = targets.get(item.id()) {
                item.set_position(*position);
            }
            item
        })
        .collect();
    result.sort_by_key(Positioned::position);
    result
}

fn stored_positions<T: Positioned>(sequence: &[T]) -> HashMap<&T::Id, usize> {
    sequence
        .iter()
        .map(|item| (item.id(), item.position()))
        .collect()
}
