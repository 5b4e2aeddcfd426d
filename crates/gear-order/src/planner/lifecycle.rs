//! Create, remove and repair planning
//!
//! New records are appended at the end of their sequence. Removing a record
//! closes the gap by renumbering what is left. Reindexing rewrites a sequence
//! that was fetched with gaps or duplicates back to `0..n`.

use super::{Plan, Removal, WriteSet, entries_of, sibling_groups};
use crate::diff::{diff_entries, diff_positions};
use crate::error::{Result, ValidationError};
use crate::model::{ContainerId, EntryId, ListState, Scope, ScopeUpdate, renumber};

/// Position a new entry takes when appended to a container
pub fn next_entry_position(state: &ListState, container_id: &ContainerId) -> Result<usize> {
    Ok(entries_of(state, container_id)?.len())
}

/// Position a new container takes when appended to the list
pub fn next_container_position(state: &ListState) -> usize {
    state.containers().len()
}

/// Remove an entry and renumber its former siblings
pub fn plan_remove_entry(state: &ListState, entry_id: &EntryId) -> Result<Plan> {
    let (container_id, index) = state
        .locate_entry(entry_id)
        .ok_or_else(|| ValidationError::UnknownEntry {
            id: entry_id.clone(),
        })?;
    let container_id = container_id.clone();
    let current = state.entries(&container_id);

    let mut next = current.to_vec();
    next.remove(index);
    renumber(&mut next);
    let writes = diff_entries(current, &next, None);

    Ok(Plan {
        updates: vec![ScopeUpdate::Entries {
            container_id: container_id.clone(),
            entries: next,
        }],
        removals: vec![Removal::Entry(entry_id.clone())],
        writes: WriteSet {
            siblings: sibling_groups([(&container_id, writes)]),
            ..WriteSet::default()
        },
        scopes: vec![Scope::Entries(container_id)],
    })
}

/// Remove a container together with its entries and renumber the remaining
/// containers
pub fn plan_remove_container(state: &ListState, container_id: &ContainerId) -> Result<Plan> {
    let index = state
        .container_index(container_id)
        .ok_or_else(|| ValidationError::UnknownContainer {
            id: container_id.clone(),
        })?;
    let current = state.containers();

    let mut next = current.to_vec();
    next.remove(index);
    renumber(&mut next);
    let writes = diff_positions(current, &next);

    Ok(Plan {
        updates: vec![
            ScopeUpdate::Containers(next),
            ScopeUpdate::DropEntries(container_id.clone()),
        ],
        removals: vec![Removal::Container(container_id.clone())],
        writes: WriteSet {
            containers: writes,
            ..WriteSet::default()
        },
        scopes: vec![
            Scope::Containers(state.list_id().clone()),
            Scope::Entries(container_id.clone()),
        ],
    })
}

/// Rewrite a container's entry positions to `0..n` keeping the current order
pub fn plan_reindex_entries(state: &ListState, container_id: &ContainerId) -> Result<Plan> {
    let current = entries_of(state, container_id)?;
    let mut next = current.to_vec();
    renumber(&mut next);
    let writes = diff_entries(current, &next, None);

    let scopes = vec![Scope::Entries(container_id.clone())];
    if writes.is_empty() {
        return Ok(Plan::noop(scopes));
    }

    Ok(Plan {
        updates: vec![ScopeUpdate::Entries {
            container_id: container_id.clone(),
            entries: next,
        }],
        removals: Vec::new(),
        writes: WriteSet {
            siblings: sibling_groups([(container_id, writes)]),
            ..WriteSet::default()
        },
        scopes,
    })
}

/// Rewrite the list's container positions to `0..n` keeping the current order
pub fn plan_reindex_containers(state: &ListState) -> Plan {
    let current = state.containers();
    let mut next = current.to_vec();
    renumber(&mut next);
    let writes = diff_positions(current, &next);

    let scopes = vec![Scope::Containers(state.list_id().clone())];
    if writes.is_empty() {
        return Plan::noop(scopes);
    }

    Plan {
        updates: vec![ScopeUpdate::Containers(next)],
        removals: Vec::new(),
        writes: WriteSet {
            containers: writes,
            ..WriteSet::default()
        },
        scopes,
    }
}
