//! Reorder coordination for gear lists
//!
//! Sits between input adapters and a [`Persistence`] store:
//!
//! - [`Coordinator`] owns the local view of one list, applies planned moves
//!   optimistically, writes them through the store and restores the view
//!   from the store when a write fails
//! - [`adapters`] translate drag gestures and "move to position" selections
//!   into move intents
//! - [`ScopeQueue`] serializes operations that touch the same container
//! - [`EventBus`] tells observers what changed
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gear_order::MoveIntent;
//! use gear_sync::{Coordinator, Persistence, Settings};
//!
//! async fn move_first_to_last<P: Persistence>(store: Arc<P>) -> gear_sync::Result<()> {
//!     let coordinator = Coordinator::load(store, "pct".into(), &Settings::default()).await?;
//!     let report = coordinator
//!         .plan_and_commit_move(MoveIntent::Reorder {
//!             container_id: "sleep".into(),
//!             entry_id: "bag".into(),
//!             from_index: 0,
//!             to_index: 2,
//!         })
//!         .await?;
//!     println!("{} writes", report.writes_issued);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod config;
mod coordinator;
mod error;
pub mod events;
mod persistence;
mod queue;

pub use config::{
    CoordinatorLayer, CoordinatorSection, QueuePolicy, Settings, SettingsLayer, WriteMode,
};
pub use coordinator::{Coordinator, MovePhase, MoveReport};
pub use error::{Error, Result};
pub use events::{EventBus, ListEvent};
pub use persistence::{
    ContainerPatch, EntryPatch, NewContainer, NewEntry, PersistResult, Persistence,
    PersistenceError,
};
pub use queue::{ListGuard, ScopeGuard, ScopeQueue};
