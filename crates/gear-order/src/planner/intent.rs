//! Move intents
//!
//! A move intent describes a requested reorder independent of where it came
//! from. Drag gestures and the "move to position" dialog both end up here.

use crate::model::{ContainerId, EntryId, ListId, Scope};
use serde::{Deserialize, Serialize};

/// A requested move, one variant per move kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveIntent {
    /// Move an entry within its own container.
    ///
    /// `to_index` is clamped to `[0, len - 1]`.
    Reorder {
        container_id: ContainerId,
        entry_id: EntryId,
        from_index: usize,
        to_index: usize,
    },

    /// Move an entry into another container, inserting before `to_index`.
    ///
    /// `to_index` is clamped to `[0, destination len]`, so the end of the
    /// destination is a valid target.
    Transfer {
        entry_id: EntryId,
        from_container_id: ContainerId,
        to_container_id: ContainerId,
        to_index: usize,
    },

    /// Move a container within the container sequence of its list.
    ///
    /// `to_index` is clamped to `[0, len - 1]`.
    ReorderContainers {
        container_id: ContainerId,
        from_index: usize,
        to_index: usize,
    },
}

impl MoveIntent {
    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Reorder { .. } => "reorder",
            Self::Transfer { .. } => "transfer",
            Self::ReorderContainers { .. } => "reorder_containers",
        }
    }

    /// The scopes this intent reads and writes, in canonical lock order
    pub fn scopes(&self, list_id: &ListId) -> Vec<Scope> {
        let mut scopes = match self {
            Self::Reorder { container_id, .. } => vec![Scope::Entries(container_id.clone())],
            Self::Transfer {
                from_container_id,
                to_container_id,
                ..
            } => vec![
                Scope::Entries(from_container_id.clone()),
                Scope::Entries(to_container_id.clone()),
            ],
            Self::ReorderContainers { .. } => vec![Scope::Containers(list_id.clone())],
        };
        scopes.sort();
        scopes.dedup();
        scopes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intents_are_tagged_by_kind() {
        let intent = MoveIntent::Transfer {
            entry_id: "a1".into(),
            from_container_id: "a".into(),
            to_container_id: "b".into(),
            to_index: 1,
        };
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["kind"], "transfer");
        assert_eq!(json["to_container_id"], "b");

        let back: MoveIntent = serde_json::from_value(json).unwrap();
        assert_eq!(back, intent);
    }

    #[test]
    fn transfer_scopes_are_sorted() {
        let intent = MoveIntent::Transfer {
            entry_id: "x".into(),
            from_container_id: "zeta".into(),
            to_container_id: "alpha".into(),
            to_index: 0,
        };
        assert_eq!(
            intent.scopes(&"l".into()),
            vec![Scope::Entries("alpha".into()), Scope::Entries("zeta".into())]
        );
    }

    #[test]
    fn container_reorder_locks_container_sequence() {
        let intent = MoveIntent::ReorderContainers {
            container_id: "a".into(),
            from_index: 0,
            to_index: 1,
        };
        assert_eq!(intent.scopes(&"l".into()), vec![Scope::Containers("l".into())]);
    }
}
