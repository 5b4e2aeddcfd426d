//! Drag-and-drop gestures

use gear_order::{ContainerId, EntryId, ListState, MoveIntent, ValidationError};
use serde::{Deserialize, Serialize};

/// What is being dragged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DragHandle {
    Entry {
        container_id: ContainerId,
        entry_id: EntryId,
    },
    Container { container_id: ContainerId },
}

/// What the pointer was over on release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DropTarget {
    /// An entry row; dropping inserts before it
    Entry {
        container_id: ContainerId,
        entry_id: EntryId,
    },
    /// A container header or empty body; dropping appends
    Container { container_id: ContainerId },
}

impl DropTarget {
    pub fn container_id(&self) -> &ContainerId {
        match self {
            Self::Entry { container_id, .. } | Self::Container { container_id } => container_id,
        }
    }
}

/// End of a drag gesture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragRelease {
    pub active: DragHandle,
    #[serde(default)]
    pub over: Option<DropTarget>,
}

/// Translate a drag release into a move intent.
///
/// Returns `Ok(None)` when the gesture changes nothing: dropped outside any
/// target, onto its own slot, or an entry onto its own container.
pub fn intent_from_drag(
    state: &ListState,
    release: &DragRelease,
) -> Result<Option<MoveIntent>, ValidationError> {
    let Some(over) = &release.over else {
        return Ok(None);
    };

    match &release.active {
        DragHandle::Entry {
            container_id,
            entry_id,
        } => {
            let from_index = entry_index(state, container_id, entry_id)?;
            match over {
                DropTarget::Entry {
                    container_id: over_container,
                    entry_id: over_entry,
                } => {
                    let to_index = entry_index(state, over_container, over_entry)?;
                    if over_container == container_id {
                        if from_index == to_index {
                            return Ok(None);
                        }
                        return Ok(Some(MoveIntent::Reorder {
                            container_id: container_id.clone(),
                            entry_id: entry_id.clone(),
                            from_index,
                            to_index,
                        }));
                    }
                    Ok(Some(MoveIntent::Transfer {
                        entry_id: entry_id.clone(),
                        from_container_id: container_id.clone(),
                        to_container_id: over_container.clone(),
                        to_index,
                    }))
                }
                DropTarget::Container {
                    container_id: target,
                } => {
                    if target == container_id {
                        return Ok(None);
                    }
                    if !state.has_container(target) {
                        return Err(ValidationError::UnknownContainer { id: target.clone() });
                    }
                    Ok(Some(MoveIntent::Transfer {
                        entry_id: entry_id.clone(),
                        from_container_id: container_id.clone(),
                        to_container_id: target.clone(),
                        to_index: state.entries(target).len(),
                    }))
                }
            }
        }
        DragHandle::Container { container_id } => {
            let from_index = container_index(state, container_id)?;
            let to_index = container_index(state, over.container_id())?;
            if from_index == to_index {
                return Ok(None);
            }
            Ok(Some(MoveIntent::ReorderContainers {
                container_id: container_id.clone(),
                from_index,
                to_index,
            }))
        }
    }
}

fn container_index(state: &ListState, id: &ContainerId) -> Result<usize, ValidationError> {
    state
        .container_index(id)
        .ok_or_else(|| ValidationError::UnknownContainer { id: id.clone() })
}

fn entry_index(
    state: &ListState,
    container_id: &ContainerId,
    entry_id: &EntryId,
) -> Result<usize, ValidationError> {
    container_index(state, container_id)?;
    if let Some(index) = state.entry_index(container_id, entry_id) {
        return Ok(index);
    }
    match state.locate_entry(entry_id) {
        Some(_) => Err(ValidationError::EntryNotInContainer {
            entry: entry_id.clone(),
            container: container_id.clone(),
        }),
        None => Err(ValidationError::UnknownEntry {
            id: entry_id.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gear_order::{Container, Entry};
    use pretty_assertions::assert_eq;

    fn state() -> ListState {
        let containers = vec![
            Container::new("sleep", "pct", "Sleep", 0),
            Container::new("cook", "pct", "Cook", 1),
            Container::new("water", "pct", "Water", 2),
        ];
        let entries = vec![
            Entry::new("bag", "sleep", 0),
            Entry::new("pad", "sleep", 1),
            Entry::new("pillow", "sleep", 2),
            Entry::new("stove", "cook", 0),
        ];
        ListState::from_parts("pct".into(), containers, entries)
    }

    fn entry(container: &str, entry: &str) -> DragHandle {
        DragHandle::Entry {
            container_id: container.into(),
            entry_id: entry.into(),
        }
    }

    fn over_entry(container: &str, entry: &str) -> Option<DropTarget> {
        Some(DropTarget::Entry {
            container_id: container.into(),
            entry_id: entry.into(),
        })
    }

    fn over_container(container: &str) -> Option<DropTarget> {
        Some(DropTarget::Container {
            container_id: container.into(),
        })
    }

    fn translate(active: DragHandle, over: Option<DropTarget>) -> Option<MoveIntent> {
        intent_from_drag(&state(), &DragRelease { active, over }).unwrap()
    }

    #[test]
    fn entry_over_sibling_reorders_to_hovered_index() {
        assert_eq!(
            translate(entry("sleep", "pillow"), over_entry("sleep", "bag")),
            Some(MoveIntent::Reorder {
                container_id: "sleep".into(),
                entry_id: "pillow".into(),
                from_index: 2,
                to_index: 0,
            })
        );
    }

    #[test]
    fn entry_over_foreign_entry_inserts_before_it() {
        assert_eq!(
            translate(entry("sleep", "pad"), over_entry("cook", "stove")),
            Some(MoveIntent::Transfer {
                entry_id: "pad".into(),
                from_container_id: "sleep".into(),
                to_container_id: "cook".into(),
                to_index: 0,
            })
        );
    }

    #[test]
    fn entry_over_container_appends() {
        assert_eq!(
            translate(entry("sleep", "pad"), over_container("cook")),
            Some(MoveIntent::Transfer {
                entry_id: "pad".into(),
                from_container_id: "sleep".into(),
                to_container_id: "cook".into(),
                to_index: 1,
            })
        );
    }

    #[test]
    fn entry_over_empty_container_lands_at_zero() {
        let intent = translate(entry("cook", "stove"), over_container("water"));
        assert!(matches!(intent, Some(MoveIntent::Transfer { to_index: 0, .. })));
    }

    #[test]
    fn container_over_entry_targets_that_entrys_container() {
        assert_eq!(
            translate(
                DragHandle::Container {
                    container_id: "water".into()
                },
                over_entry("sleep", "pad")
            ),
            Some(MoveIntent::ReorderContainers {
                container_id: "water".into(),
                from_index: 2,
                to_index: 0,
            })
        );
    }

    #[test]
    fn gestures_that_change_nothing_yield_no_intent() {
        assert_eq!(translate(entry("sleep", "pad"), None), None);
        assert_eq!(translate(entry("sleep", "pad"), over_entry("sleep", "pad")), None);
        assert_eq!(translate(entry("sleep", "pad"), over_container("sleep")), None);
        assert_eq!(
            translate(
                DragHandle::Container {
                    container_id: "cook".into()
                },
                over_container("cook")
            ),
            None
        );
    }

    #[test]
    fn unknown_records_are_rejected() {
        let release = DragRelease {
            active: entry("sleep", "tarp"),
            over: over_container("cook"),
        };
        assert_eq!(
            intent_from_drag(&state(), &release),
            Err(ValidationError::UnknownEntry { id: "tarp".into() })
        );

        let release = DragRelease {
            active: entry("cook", "bag"),
            over: over_container("water"),
        };
        assert_eq!(
            intent_from_drag(&state(), &release),
            Err(ValidationError::EntryNotInContainer {
                entry: "bag".into(),
                container: "cook".into(),
            })
        );
    }
}
