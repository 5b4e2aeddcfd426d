//! Input adapters
//!
//! Drag gestures and the "move to position" dialog both reduce to a
//! [`MoveIntent`](gear_order::MoveIntent) and go through [`Coordinator::plan_and_commit_move`], so the
//! two entry points cannot drift apart.

mod drag;
mod manual;

pub use drag::{DragHandle, DragRelease, DropTarget, intent_from_drag};
pub use manual::{ManualMove, current_position, intent_from_manual, position_options};

use crate::Result;
use crate::coordinator::{Coordinator, MoveReport};
use crate::persistence::Persistence;

impl<P: Persistence> Coordinator<P> {
    /// Commit a drag release; `Ok(None)` when the gesture changes nothing
    pub async fn commit_drag(&self, release: &DragRelease) -> Result<Option<MoveReport>> {
        let intent = intent_from_drag(&self.snapshot().await, release)?;
        match intent {
            Some(intent) => self.plan_and_commit_move(intent).await.map(Some),
            None => {
                tracing::debug!(?release, "Drag release maps to no move");
                Ok(None)
            }
        }
    }

    /// Commit a "move to position" selection
    pub async fn commit_manual(&self, selection: &ManualMove) -> Result<MoveReport> {
        let intent = intent_from_manual(&self.snapshot().await, selection)?;
        self.plan_and_commit_move(intent).await
    }
}
