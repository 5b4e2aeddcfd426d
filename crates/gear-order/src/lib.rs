//! Ordering engine for gear lists
//!
//! A gear list holds ordered containers (categories), and every container holds
//! an ordered sequence of entries (items). This crate is the pure, synchronous
//! half of the reorder engine:
//!
//! - **Position model**: [`Container`], [`Entry`] and [`ListState`] together with
//!   the contiguity and consistency predicates
//! - **Diff calculator**: the minimal set of position writes between two orderings
//! - **Move planner**: turns a [`MoveIntent`] into the next local state plus the
//!   writes needed to persist it
//!
//! Nothing here performs I/O. Persistence, optimistic application and rollback
//! live in `gear-sync`.
//!
//! # Example
//!
//! ```
//! use gear_order::{Container, Entry, ListState, MoveIntent, plan_move};
//!
//! let state = ListState::from_parts(
//!     "trip".into(),
//!     vec![Container::new("shelter", "trip", "Shelter", 0)],
//!     vec![
//!         Entry::new("tent", "shelter", 0),
//!         Entry::new("stakes", "shelter", 1),
//!     ],
//! );
//!
//! let plan = plan_move(
//!     &state,
//!     &MoveIntent::Reorder {
//!         container_id: "shelter".into(),
//!         entry_id: "stakes".into(),
//!         from_index: 1,
//!         to_index: 0,
//!     },
//! )
//! .unwrap();
//!
//! assert_eq!(plan.writes.len(), 2);
//! ```

pub mod diff;
pub mod error;
pub mod model;
pub mod planner;

pub use diff::{
    ContainerChange, ContainerWrite, EntryWrite, PositionWrite, apply_writes, diff_entries,
    diff_positions,
};
pub use error::{Result, ValidationError};
pub use model::{
    Container, ContainerId, Entry, EntryId, InvariantViolation, ListId, ListState, Payload,
    Positioned, Scope, ScopeUpdate, is_consistent, is_contiguous, renumber, sort_by_position,
};
pub use planner::{
    MoveIntent, Plan, Removal, SiblingWrites, WriteSet, array_move, next_container_position,
    next_entry_position, plan_move, plan_reindex_containers, plan_reindex_entries,
    plan_remove_container, plan_remove_entry,
};
