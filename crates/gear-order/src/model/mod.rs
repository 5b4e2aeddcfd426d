//! Position model
//!
//! Containers are ordered within their list, entries are ordered within their
//! container. In both cases positions are 0-based, unique and contiguous.

mod ids;
mod state;

pub use ids::{ContainerId, EntryId, ListId};
pub use state::{InvariantViolation, ListState};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::hash::Hash;

/// Opaque entry fields (name, weight, price, ...) carried through unchanged
pub type Payload = serde_json::Map<String, Value>;

/// A named, ordered grouping of entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub id: ContainerId,
    pub list_id: ListId,
    pub title: String,
    pub position: usize,
}

impl Container {
    pub fn new(
        id: impl Into<ContainerId>,
        list_id: impl Into<ListId>,
        title: impl Into<String>,
        position: usize,
    ) -> Self {
        Self {
            id: id.into(),
            list_id: list_id.into(),
            title: title.into(),
            position,
        }
    }
}

/// A single ordered record belonging to exactly one container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub container_id: ContainerId,
    pub position: usize,
    #[serde(default, skip_serializing_if = "Payload::is_empty")]
    pub payload: Payload,
}

impl Entry {
    pub fn new(id: impl Into<EntryId>, container_id: impl Into<ContainerId>, position: usize) -> Self {
        Self {
            id: id.into(),
            container_id: container_id.into(),
            position,
            payload: Payload::new(),
        }
    }

    /// Attach payload fields
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// The human-facing name stored in the payload, if any
    pub fn name(&self) -> Option<&str> {
        self.payload.get("name").and_then(Value::as_str)
    }
}

/// Anything that occupies a slot in an ordered sequence
pub trait Positioned {
    type Id: Clone + Eq + Hash + fmt::Debug;

    fn id(&self) -> &Self::Id;
    fn position(&self) -> usize;
    fn set_position(&mut self, position: usize);
}

impl Positioned for Container {
    type Id = ContainerId;

    fn id(&self) -> &ContainerId {
        &self.id
    }

    fn position(&self) -> usize {
        self.position
    }

    fn set_position(&mut self, position: usize) {
        self.position = position;
    }
}

impl Positioned for Entry {
    type Id = EntryId;

    fn id(&self) -> &EntryId {
        &self.id
    }

    fn position(&self) -> usize {
        self.position
    }

    fn set_position(&mut self, position: usize) {
        self.position = position;
    }
}

/// True iff the stored positions are exactly `0..n` in array order
pub fn is_contiguous<T: Positioned>(sequence: &[T]) -> bool {
    sequence
        .iter()
        .enumerate()
        .all(|(index, item)| item.position() == index)
}

/// True iff the entry points at the container
pub fn is_consistent(entry: &Entry, container: &Container) -> bool {
    entry.container_id == container.id
}

/// Sort by stored position, breaking ties by id
pub fn sort_by_position<T>(sequence: &mut [T])
where
    T: Positioned,
    T::Id: Ord,
{
    sequence.sort_by(|a, b| {
        a.position()
            .cmp(&b.position())
            .then_with(|| a.id().cmp(b.id()))
    });
}

/// Reassign positions from array indices
pub fn renumber<T: Positioned>(sequence: &mut [T]) {
    for (index, item) in sequence.iter_mut().enumerate() {
        item.set_position(index);
    }
}

/// One independently lockable and re-fetchable slice of a list.
///
/// The derived ordering is the canonical lock order: the container sequence of
/// a list sorts before any entry sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "snake_case")]
pub enum Scope {
    /// The container sequence of a list
    Containers(ListId),
    /// The entry sequence of a container
    Entries(ContainerId),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Containers(list_id) => write!(f, "containers of list {list_id}"),
            Self::Entries(container_id) => write!(f, "entries of container {container_id}"),
        }
    }
}

/// A replacement for one scope of a [`ListState`]
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeUpdate {
    /// Replace the whole container sequence
    Containers(Vec<Container>),
    /// Replace the entry sequence of one container
    Entries {
        container_id: ContainerId,
        entries: Vec<Entry>,
    },
    /// Forget a container's entry sequence
    DropEntries(ContainerId),
}
