//! "Move to position" dialog

use std::ops::RangeInclusive;

use gear_order::{ContainerId, EntryId, ListState, MoveIntent, ValidationError};
use serde::{Deserialize, Serialize};

/// An explicit container and 1-based slot chosen for an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualMove {
    pub entry_id: EntryId,
    pub to_container_id: ContainerId,
    /// 1-based slot as shown to the user
    pub position: usize,
}

/// Slots the dialog offers for moving `entry_id` into `to_container_id`.
///
/// Staying in the same container offers `1..=len`; another container also
/// offers the slot after its last entry.
pub fn position_options(
    state: &ListState,
    entry_id: &EntryId,
    to_container_id: &ContainerId,
) -> Result<RangeInclusive<usize>, ValidationError> {
    let (from_container_id, _) = locate(state, entry_id)?;
    if !state.has_container(to_container_id) {
        return Err(ValidationError::UnknownContainer {
            id: to_container_id.clone(),
        });
    }

    let len = state.entries(to_container_id).len();
    if &from_container_id == to_container_id {
        Ok(1..=len)
    } else {
        Ok(1..=len + 1)
    }
}

/// The slot the dialog preselects: where the entry is now
pub fn current_position(state: &ListState, entry_id: &EntryId) -> Result<usize, ValidationError> {
    locate(state, entry_id).map(|(_, index)| index + 1)
}

/// Translate a dialog selection into a move intent.
///
/// Out-of-range slots are not rejected here; the planner clamps them the same
/// way it clamps drag targets.
pub fn intent_from_manual(
    state: &ListState,
    selection: &ManualMove,
) -> Result<MoveIntent, ValidationError> {
    if selection.position == 0 {
        return Err(ValidationError::PositionOutOfRange {
            position: selection.position,
        });
    }
    let (from_container_id, from_index) = locate(state, &selection.entry_id)?;
    if !state.has_container(&selection.to_container_id) {
        return Err(ValidationError::UnknownContainer {
            id: selection.to_container_id.clone(),
        });
    }

    let to_index = selection.position - 1;
    if from_container_id == selection.to_container_id {
        Ok(MoveIntent::Reorder {
            container_id: from_container_id,
            entry_id: selection.entry_id.clone(),
            from_index,
            to_index,
        })
    } else {
        Ok(MoveIntent::Transfer {
            entry_id: selection.entry_id.clone(),
            from_container_id,
            to_container_id: selection.to_container_id.clone(),
            to_index,
        })
    }
}

fn locate(state: &ListState, entry_id: &EntryId) -> Result<(ContainerId, usize), ValidationError> {
    state
        .locate_entry(entry_id)
        .map(|(container_id, index)| (container_id.clone(), index))
        .ok_or_else(|| ValidationError::UnknownEntry {
            id: entry_id.clone(),
        })
}
