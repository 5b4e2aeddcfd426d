//! Reorder coordinator
//!
//! Owns the local [`ListState`] of one list and drives every mutation through
//! the same lifecycle:
//!
//! 1. acquire the scopes the operation touches
//! 2. plan against the current state (validation errors stop here)
//! 3. apply the planned state locally and notify observers
//! 4. issue the planned writes, in order
//! 5. on failure, re-fetch the affected scopes and report the error
//!
//! A full-list refresh waits until no operation holds any scope, so it never
//! snapshots a container whose writes are still in flight.
//!
//! Observers see each step as a [`ListEvent::Phase`].

mod lifecycle;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use gear_order::{
    ListId, ListState, MoveIntent, Plan, Removal, Scope, ScopeUpdate, ValidationError,
    plan_move, sort_by_position,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, broadcast};

use crate::config::{CoordinatorSection, Settings, WriteMode};
use crate::events::{EventBus, ListEvent};
use crate::persistence::{ContainerPatch, EntryPatch, PersistResult, Persistence, PersistenceError};
use crate::queue::{ScopeGuard, ScopeQueue};
use crate::{Error, Result};

/// Where an operation is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovePhase {
    /// Nothing to do; the request was a no-op
    Idle,
    /// The planned state is visible locally
    OptimisticallyApplied,
    /// Writes are in flight
    Persisting,
    /// Every write succeeded
    Settled,
    /// A write failed and the affected scopes were re-read
    RolledBack,
}

/// Outcome of a successful operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveReport {
    pub operation: u64,
    pub phase: MovePhase,
    /// Number of persistence calls issued
    pub writes_issued: usize,
    pub scopes: Vec<Scope>,
}

/// How to restore the local view after a failed write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recovery {
    /// Re-read only the scopes the plan touched
    Scopes,
    /// Re-read the whole list
    Full,
}

pub struct Coordinator<P> {
    store: Arc<P>,
    list_id: ListId,
    settings: CoordinatorSection,
    state: Mutex<ListState>,
    queue: ScopeQueue,
    events: EventBus,
    operations: AtomicU64,
}

impl<P: Persistence> Coordinator<P> {
    /// Create a coordinator with an empty local view.
    ///
    /// Call [`Coordinator::refresh`] (or use [`Coordinator::load`]) before
    /// planning against a populated list.
    pub fn new(store: Arc<P>, list_id: ListId, settings: &Settings) -> Self {
        let settings = settings.coordinator.clone();
        Self {
            store,
            state: Mutex::new(ListState::new(list_id.clone())),
            list_id,
            queue: ScopeQueue::new(settings.queue_policy),
            events: EventBus::new(settings.event_capacity),
            operations: AtomicU64::new(0),
            settings,
        }
    }

    /// Create a coordinator and read the list from the store
    pub async fn load(store: Arc<P>, list_id: ListId, settings: &Settings) -> Result<Self> {
        let coordinator = Self::new(store, list_id, settings);
        coordinator.refresh().await?;
        Ok(coordinator)
    }

    pub fn list_id(&self) -> &ListId {
        &self.list_id
    }

    pub fn store(&self) -> &Arc<P> {
        &self.store
    }

    pub fn settings(&self) -> &CoordinatorSection {
        &self.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ListEvent> {
        self.events.subscribe()
    }

    /// Copy of the current local view
    pub async fn snapshot(&self) -> ListState {
        self.state.lock().await.clone()
    }

    /// Validate, apply and persist a move.
    ///
    /// Validation failures leave the local state untouched. A persistence
    /// failure re-reads the affected scopes before the error is returned, so
    /// the local view matches the store again.
    pub async fn plan_and_commit_move(&self, intent: MoveIntent) -> Result<MoveReport> {
        let scopes = intent.scopes(&self.list_id);
        tracing::debug!(kind = intent.kind(), ?scopes, "Planning move");
        self.run(intent.kind(), scopes, Recovery::Scopes, |state| {
            plan_move(state, &intent)
        })
        .await
    }

    /// Re-read every container and entry of the list, replacing the local view.
    ///
    /// Waits for every in-flight operation to finish first.
    pub async fn refresh(&self) -> Result<()> {
        let _list = self.queue.acquire_list().await;
        let containers = self
            .call(self.store.fetch_containers(&self.list_id))
            .await?;
        let mut entries = Vec::new();
        for container in &containers {
            entries.extend(self.call(self.store.fetch_entries(&container.id)).await?);
        }

        let fresh = ListState::from_parts(self.list_id.clone(), containers, entries);
        let violations = fresh.check_invariants();
        if !violations.is_empty() {
            tracing::warn!(
                list = %self.list_id,
                count = violations.len(),
                first = %violations[0],
                "Stored positions are not contiguous; reindex to repair"
            );
        }

        *self.state.lock().await = fresh;
        tracing::debug!(list = %self.list_id, "Refreshed list");
        self.events.publish(ListEvent::Refreshed {
            list_id: self.list_id.clone(),
        });
        Ok(())
    }

    /// Shared lifecycle of every planned operation
    async fn run<F>(
        &self,
        kind: &'static str,
        scopes: Vec<Scope>,
        recovery: Recovery,
        planner: F,
    ) -> Result<MoveReport>
    where
        F: FnOnce(&ListState) -> gear_order::Result<Plan>,
    {
        let guard = self.queue.acquire(&scopes).await?;
        let operation = self.operations.fetch_add(1, Ordering::Relaxed) + 1;

        let plan = {
            let mut state = self.state.lock().await;
            let plan = planner(&state)?;
            if let Some(unlocked) = plan.scopes.iter().find(|s| !guard.covers(s)) {
                // The record moved between lookup and locking
                return Err(Error::Busy {
                    scope: unlocked.clone(),
                });
            }
            if plan.is_noop() {
                tracing::debug!(operation, kind, "Nothing to do");
                return Ok(MoveReport {
                    operation,
                    phase: MovePhase::Idle,
                    writes_issued: 0,
                    scopes: plan.scopes,
                });
            }
            state.apply(plan.updates.iter().cloned());
            plan
        };

        self.phase(operation, kind, MovePhase::OptimisticallyApplied, &plan.scopes);
        self.phase(operation, kind, MovePhase::Persisting, &plan.scopes);

        match self.persist(&plan).await {
            Ok(writes_issued) => {
                tracing::info!(operation, kind, writes_issued, "Operation settled");
                self.phase(operation, kind, MovePhase::Settled, &plan.scopes);
                Ok(MoveReport {
                    operation,
                    phase: MovePhase::Settled,
                    writes_issued,
                    scopes: plan.scopes,
                })
            }
            Err(source) => {
                tracing::warn!(operation, kind, error = %source, "Write failed; rolling back");
                let err = self.recover(recovery, guard, &plan.scopes, source).await;
                self.phase(operation, kind, MovePhase::RolledBack, &plan.scopes);
                Err(err)
            }
        }
    }

    /// Issue a plan's removals and writes, stopping at the first failure
    async fn persist(&self, plan: &Plan) -> PersistResult<usize> {
        let mut issued = 0;

        for removal in &plan.removals {
            match removal {
                Removal::Entry(id) => self.call(self.store.delete_entry(id)).await?,
                Removal::Container(id) => self.call(self.store.delete_container(id)).await?,
            }
            issued += 1;
        }

        let writes = &plan.writes;
        if self.settings.write_mode == WriteMode::Batched && self.store.supports_batch() {
            for batch in writes.entry_batches() {
                tracing::debug!(
                    container = %batch.container_id,
                    count = batch.writes.len(),
                    "Writing entry batch"
                );
                self.call(self.store.set_entry_positions(&batch.container_id, &batch.writes))
                    .await?;
                issued += 1;
            }
            if !writes.containers.is_empty() {
                self.call(
                    self.store
                        .set_container_positions(&self.list_id, &writes.containers),
                )
                .await?;
                issued += 1;
            }
        } else {
            for write in writes.entry_writes() {
                tracing::debug!(
                    entry = %write.id,
                    position = write.position,
                    container = ?write.container,
                    "Writing entry position"
                );
                self.call(self.store.update_entry(&write.id, EntryPatch::from(write)))
                    .await?;
                issued += 1;
            }
            for write in &writes.containers {
                tracing::debug!(container = %write.id, position = write.position, "Writing container position");
                self.call(
                    self.store
                        .update_container(&write.id, ContainerPatch::position(write.position)),
                )
                .await?;
                issued += 1;
            }
        }

        Ok(issued)
    }

    /// Restore the local view after a failed write and build the error to report.
    ///
    /// Scoped reconciliation runs under `guard`. A full refresh releases it
    /// first and then waits for the whole list.
    async fn recover(
        &self,
        recovery: Recovery,
        guard: ScopeGuard,
        scopes: &[Scope],
        source: PersistenceError,
    ) -> Error {
        let outcome = match recovery {
            Recovery::Scopes => match self.reconcile(scopes).await {
                Err(Error::Consistency { scope, reason }) => {
                    drop(guard);
                    tracing::error!(%scope, %reason, "Store disagrees with local invariants; refreshing list");
                    if let Err(err) = self.refresh().await {
                        tracing::error!(error = %err, "Full refresh failed");
                    }
                    Err(Error::Consistency { scope, reason })
                }
                outcome => outcome,
            },
            Recovery::Full => {
                drop(guard);
                self.refresh().await
            }
        };
        match outcome {
            Ok(()) => Error::Persistence {
                source,
                reconciled: true,
            },
            Err(err @ Error::Consistency { .. }) => err,
            Err(err) => {
                tracing::error!(error = %err, "Reconciliation failed; local view may diverge");
                Error::Persistence {
                    source,
                    reconciled: false,
                }
            }
        }
    }

    /// Re-read the given scopes and replace them locally.
    ///
    /// Fetched data that breaks the invariants yields [`Error::Consistency`]
    /// and leaves the caller to refresh the whole list.
    async fn reconcile(&self, scopes: &[Scope]) -> Result<()> {
        let mut updates = Vec::with_capacity(scopes.len());

        for scope in scopes {
            match scope {
                Scope::Containers(list_id) => {
                    let mut containers = self.call(self.store.fetch_containers(list_id)).await?;
                    sort_by_position(&mut containers);
                    updates.push(ScopeUpdate::Containers(containers));
                }
                Scope::Entries(container_id) => {
                    let mut entries = match self.call(self.store.fetch_entries(container_id)).await {
                        Ok(entries) => entries,
                        Err(PersistenceError::NotFound { .. }) => {
                            return Err(inconsistent(scope, "container no longer exists"));
                        }
                        Err(err) => return Err(err.into()),
                    };
                    if let Some(stray) = entries.iter().find(|e| &e.container_id != container_id) {
                        let reason = format!(
                            "entry {} reports container {}",
                            stray.id, stray.container_id
                        );
                        return Err(inconsistent(scope, reason));
                    }
                    sort_by_position(&mut entries);
                    updates.push(ScopeUpdate::Entries {
                        container_id: container_id.clone(),
                        entries,
                    });
                }
            }
        }

        let orphan = {
            let mut state = self.state.lock().await;
            state.apply(updates);
            state.orphaned_groups().first().map(|id| (*id).clone())
        };
        if let Some(container_id) = orphan {
            let scope = Scope::Entries(container_id);
            return Err(inconsistent(&scope, "entries remain for a removed container"));
        }

        tracing::debug!(?scopes, "Reconciled scopes");
        Ok(())
    }

    /// Run one persistence call under the configured timeout
    async fn call<T, F>(&self, call: F) -> PersistResult<T>
    where
        F: Future<Output = PersistResult<T>>,
    {
        let limit = self.settings.write_timeout();
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or_else(|_| Err(PersistenceError::Timeout { after: limit }))
    }

    fn phase(&self, operation: u64, kind: &'static str, phase: MovePhase, scopes: &[Scope]) {
        tracing::trace!(operation, kind, ?phase, "Phase change");
        self.events.publish(ListEvent::Phase {
            operation,
            kind,
            phase,
            scopes: scopes.to_vec(),
        });
    }
}

fn inconsistent(scope: &Scope, reason: impl Into<String>) -> Error {
    Error::Consistency {
        scope: scope.clone(),
        reason: reason.into(),
    }
}

/// Reject requests for records that are not part of the local view
fn unknown_entry(id: &gear_order::EntryId) -> Error {
    Error::Validation(ValidationError::UnknownEntry { id: id.clone() })
}
