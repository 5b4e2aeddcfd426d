//! Move planner
//!
//! Pure functions from `(state, intent)` to a [`Plan`]: the next sequences of
//! every touched scope plus the minimal writes that persist them. Planning
//! never mutates the state it reads; the caller decides when to apply.

mod intent;
mod lifecycle;

pub use intent::MoveIntent;
pub use lifecycle::{
    next_container_position, next_entry_position, plan_reindex_containers, plan_reindex_entries,
    plan_remove_container, plan_remove_entry,
};

use crate::diff::{ContainerChange, ContainerWrite, EntryWrite, diff_entries, diff_positions};
use crate::error::{Result, ValidationError};
use crate::model::{ContainerId, Entry, EntryId, ListState, Scope, ScopeUpdate, renumber};

/// Entry writes that belong to one container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingWrites {
    pub container_id: ContainerId,
    pub writes: Vec<EntryWrite>,
}

/// Records a plan deletes before its position writes are issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    Entry(EntryId),
    Container(ContainerId),
}

/// Position writes of a plan, grouped in issue order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSet {
    /// The moved entry's own write, issued first
    pub moved: Option<EntryWrite>,
    /// Container the moved entry ends up in
    pub moved_into: Option<ContainerId>,
    /// Sibling renumbers: source container first, then destination
    pub siblings: Vec<SiblingWrites>,
    /// Container renumbers, the moved container first
    pub containers: Vec<ContainerWrite>,
}

impl WriteSet {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of single-record writes
    pub fn len(&self) -> usize {
        self.moved.iter().count()
            + self.siblings.iter().map(|s| s.writes.len()).sum::<usize>()
            + self.containers.len()
    }

    /// Entry writes in issue order: moved entry, source siblings, destination
    /// siblings
    pub fn entry_writes(&self) -> impl Iterator<Item = &EntryWrite> {
        self.moved
            .iter()
            .chain(self.siblings.iter().flat_map(|group| group.writes.iter()))
    }

    /// Entry writes grouped per container for batch-capable stores.
    ///
    /// The group receiving the moved entry comes first with the moved write at
    /// its head.
    pub fn entry_batches(&self) -> Vec<SiblingWrites> {
        let mut batches: Vec<SiblingWrites> = Vec::new();

        if let (Some(moved), Some(container_id)) = (&self.moved, &self.moved_into) {
            batches.push(SiblingWrites {
                container_id: container_id.clone(),
                writes: vec![moved.clone()],
            });
        }

        for group in &self.siblings {
            match batches.iter_mut().find(|b| b.container_id == group.container_id) {
                Some(batch) => batch.writes.extend(group.writes.iter().cloned()),
                None => batches.push(group.clone()),
            }
        }

        batches
    }
}

/// Outcome of planning: what to show now and what to persist
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    /// Replacements to apply to local state, in order
    pub updates: Vec<ScopeUpdate>,
    /// Deletions issued before the writes
    pub removals: Vec<Removal>,
    pub writes: WriteSet,
    /// Every scope the plan touches, in canonical lock order
    pub scopes: Vec<Scope>,
}

impl Plan {
    fn noop(scopes: Vec<Scope>) -> Self {
        Self {
            scopes,
            ..Self::default()
        }
    }

    /// True when nothing needs to change locally or remotely
    pub fn is_noop(&self) -> bool {
        self.updates.is_empty() && self.removals.is_empty() && self.writes.is_empty()
    }
}

/// Remove the element at `from` and reinsert it at `to`.
///
/// Out-of-range `from` leaves the sequence untouched; `to` is clamped to the
/// last index.
pub fn array_move<T>(sequence: &mut Vec<T>, from: usize, to: usize) {
    if from >= sequence.len() {
        return;
    }
    let to = to.min(sequence.len() - 1);
    if from == to {
        return;
    }
    let item = sequence.remove(from);
    sequence.insert(to, item);
}

/// Plan a move intent against the current state
pub fn plan_move(state: &ListState, intent: &MoveIntent) -> Result<Plan> {
    let plan = match intent {
        MoveIntent::Reorder {
            container_id,
            entry_id,
            from_index,
            to_index,
        } => plan_reorder(state, container_id, entry_id, *from_index, *to_index)?,
        MoveIntent::Transfer {
            entry_id,
            from_container_id,
            to_container_id,
            to_index,
        } => plan_transfer(state, entry_id, from_container_id, to_container_id, *to_index)?,
        MoveIntent::ReorderContainers {
            container_id,
            from_index,
            to_index,
        } => plan_reorder_containers(state, container_id, *from_index, *to_index)?,
    };

    tracing::trace!(
        kind = intent.kind(),
        writes = plan.writes.len(),
        noop = plan.is_noop(),
        "Planned move"
    );
    Ok(plan)
}

fn plan_reorder(
    state: &ListState,
    container_id: &ContainerId,
    entry_id: &EntryId,
    from_index: usize,
    to_index: usize,
) -> Result<Plan> {
    let current = entries_of(state, container_id)?;
    let actual = current
        .iter()
        .position(|e| &e.id == entry_id)
        .ok_or_else(|| not_in_container(state, entry_id, container_id))?;
    check_index(entry_id.as_str(), from_index, actual)?;

    let scopes = vec![Scope::Entries(container_id.clone())];
    let target = to_index.min(current.len() - 1);
    if target == actual {
        return Ok(Plan::noop(scopes));
    }

    let mut next = current.to_vec();
    array_move(&mut next, actual, target);
    renumber(&mut next);

    let mut writes = diff_entries(current, &next, None);
    let moved = take_write(&mut writes, entry_id);

    Ok(Plan {
        updates: vec![ScopeUpdate::Entries {
            container_id: container_id.clone(),
            entries: next,
        }],
        removals: Vec::new(),
        writes: WriteSet {
            moved,
            moved_into: Some(container_id.clone()),
            siblings: sibling_groups([(container_id, writes)]),
            containers: Vec::new(),
        },
        scopes,
    })
}

fn plan_transfer(
    state: &ListState,
    entry_id: &EntryId,
    from: &ContainerId,
    to: &ContainerId,
    to_index: usize,
) -> Result<Plan> {
    if from == to {
        return Err(ValidationError::SameContainerTransfer {
            container: from.clone(),
        });
    }

    let source = entries_of(state, from)?;
    let destination = entries_of(state, to)?;
    let removed_at = source
        .iter()
        .position(|e| &e.id == entry_id)
        .ok_or_else(|| not_in_container(state, entry_id, from))?;
    let target = to_index.min(destination.len());

    let mut next_source = source.to_vec();
    let mut moved = next_source.remove(removed_at);
    renumber(&mut next_source);

    moved.container_id = to.clone();
    let mut next_destination = destination.to_vec();
    next_destination.insert(target, moved);
    renumber(&mut next_destination);

    let change = ContainerChange {
        id: entry_id.clone(),
        to: to.clone(),
    };
    let source_writes = diff_entries(source, &next_source, None);
    let mut destination_writes = diff_entries(destination, &next_destination, Some(&change));
    let moved_write = take_write(&mut destination_writes, entry_id);

    let mut scopes = vec![Scope::Entries(from.clone()), Scope::Entries(to.clone())];
    scopes.sort();

    Ok(Plan {
        updates: vec![
            ScopeUpdate::Entries {
                container_id: from.clone(),
                entries: next_source,
            },
            ScopeUpdate::Entries {
                container_id: to.clone(),
                entries: next_destination,
            },
        ],
        removals: Vec::new(),
        writes: WriteSet {
            moved: moved_write,
            moved_into: Some(to.clone()),
            siblings: sibling_groups([(from, source_writes), (to, destination_writes)]),
            containers: Vec::new(),
        },
        scopes,
    })
}

fn plan_reorder_containers(
    state: &ListState,
    container_id: &ContainerId,
    from_index: usize,
    to_index: usize,
) -> Result<Plan> {
    let current = state.containers();
    let actual = state
        .container_index(container_id)
        .ok_or_else(|| ValidationError::UnknownContainer {
            id: container_id.clone(),
        })?;
    check_index(container_id.as_str(), from_index, actual)?;

    let scopes = vec![Scope::Containers(state.list_id().clone())];
    let target = to_index.min(current.len() - 1);
    if target == actual {
        return Ok(Plan::noop(scopes));
    }

    let mut next = current.to_vec();
    array_move(&mut next, actual, target);
    renumber(&mut next);

    let mut writes = diff_positions(current, &next);
    if let Some(at) = writes.iter().position(|w| &w.id == container_id) {
        let moved = writes.remove(at);
        writes.insert(0, moved);
    }

    Ok(Plan {
        updates: vec![ScopeUpdate::Containers(next)],
        removals: Vec::new(),
        writes: WriteSet {
            containers: writes,
            ..WriteSet::default()
        },
        scopes,
    })
}

/// Entries of a container that must exist in this list
fn entries_of<'a>(state: &'a ListState, container_id: &ContainerId) -> Result<&'a [Entry]> {
    let container = state
        .container(container_id)
        .ok_or_else(|| ValidationError::UnknownContainer {
            id: container_id.clone(),
        })?;
    if &container.list_id != state.list_id() {
        return Err(ValidationError::ForeignContainer {
            container: container_id.clone(),
            expected: state.list_id().clone(),
            found: container.list_id.clone(),
        });
    }
    Ok(state.entries(container_id))
}

fn not_in_container(state: &ListState, entry_id: &EntryId, container_id: &ContainerId) -> ValidationError {
    if state.locate_entry(entry_id).is_some() {
        ValidationError::EntryNotInContainer {
            entry: entry_id.clone(),
            container: container_id.clone(),
        }
    } else {
        ValidationError::UnknownEntry {
            id: entry_id.clone(),
        }
    }
}

fn check_index(id: &str, stated: usize, actual: usize) -> Result<()> {
    if stated == actual {
        Ok(())
    } else {
        Err(ValidationError::StaleIndex {
            id: id.to_string(),
            stated,
            actual,
        })
    }
}

fn take_write(writes: &mut Vec<EntryWrite>, entry_id: &EntryId) -> Option<EntryWrite> {
    let at = writes.iter().position(|w| &w.id == entry_id)?;
    Some(writes.remove(at))
}

fn sibling_groups<'a>(
    groups: impl IntoIterator<Item = (&'a ContainerId, Vec<EntryWrite>)>,
) -> Vec<SiblingWrites> {
    groups
        .into_iter()
        .filter(|(_, writes)| !writes.is_empty())
        .map(|(container_id, writes)| SiblingWrites {
            container_id: container_id.clone(),
            writes,
        })
        .collect()
}
