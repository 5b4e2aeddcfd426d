//! Per-scope serialization of operations.
//!
//! Each [`Scope`] has its own async mutex. An operation acquires every scope it
//! touches in [`Scope`]'s `Ord` order, which rules out lock-order deadlocks
//! between transfers that cross the same containers in opposite directions.
//! Operations on disjoint scopes run concurrently.
//!
//! A full refresh replaces every scope at once, including containers no
//! operation has named yet. It takes the list gate exclusively, which every
//! scope guard holds shared, so it only runs once no operation is in flight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use gear_order::Scope;
use tokio::sync::{
    Mutex as AsyncMutex, OwnedMutexGuard, OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock,
};

use crate::config::QueuePolicy;
use crate::{Error, Result};

/// Held scopes; released on drop
#[must_use = "scopes are released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ScopeGuard {
    scopes: Vec<Scope>,
    _held: Vec<OwnedMutexGuard<()>>,
    _gate: OwnedRwLockReadGuard<()>,
}

impl ScopeGuard {
    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    pub fn covers(&self, scope: &Scope) -> bool {
        self.scopes.contains(scope)
    }
}

/// Exclusive hold on the whole list; released on drop
#[must_use = "the list is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ListGuard {
    _gate: OwnedRwLockWriteGuard<()>,
}

#[derive(Debug, Default)]
pub struct ScopeQueue {
    policy: QueuePolicy,
    gate: Arc<RwLock<()>>,
    locks: Mutex<HashMap<Scope, Arc<AsyncMutex<()>>>>,
}

impl ScopeQueue {
    pub fn new(policy: QueuePolicy) -> Self {
        Self {
            policy,
            gate: Arc::new(RwLock::new(())),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> QueuePolicy {
        self.policy
    }

    /// Acquire all `scopes`, waiting or failing according to the policy
    pub async fn acquire(&self, scopes: &[Scope]) -> Result<ScopeGuard> {
        let mut ordered = scopes.to_vec();
        ordered.sort();
        ordered.dedup();

        let gate = match (self.policy, ordered.first()) {
            (QueuePolicy::Reject, Some(first)) => Arc::clone(&self.gate)
                .try_read_owned()
                .map_err(|_| Error::Busy {
                    scope: first.clone(),
                })?,
            _ => Arc::clone(&self.gate).read_owned().await,
        };

        let mut held = Vec::with_capacity(ordered.len());
        for scope in &ordered {
            let lock = self.lock_for(scope);
            let guard = match self.policy {
                QueuePolicy::Wait => {
                    if lock.try_lock().is_err() {
                        tracing::debug!(%scope, "Waiting for scope");
                    }
                    lock.lock_owned().await
                }
                QueuePolicy::Reject => lock
                    .try_lock_owned()
                    .map_err(|_| Error::Busy {
                        scope: scope.clone(),
                    })?,
            };
            held.push(guard);
        }

        Ok(ScopeGuard {
            scopes: ordered,
            _held: held,
            _gate: gate,
        })
    }

    /// Wait until no operation holds any scope, then hold the whole list.
    ///
    /// Always waits, whatever the policy: callers are recovering, not
    /// starting new work. Must not be called while holding a [`ScopeGuard`].
    pub async fn acquire_list(&self) -> ListGuard {
        if self.gate.try_write().is_err() {
            tracing::debug!("Waiting for in-flight operations before full refresh");
        }
        ListGuard {
            _gate: Arc::clone(&self.gate).write_owned().await,
        }
    }

    /// Whether some operation currently holds `scope`
    pub fn is_busy(&self, scope: &Scope) -> bool {
        self.lock_for(scope).try_lock().is_err()
    }

    fn lock_for(&self, scope: &Scope) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(scope.clone()).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gear_order::{ContainerId, ListId};
    use std::time::Duration;

    fn entries(id: &str) -> Scope {
        Scope::Entries(ContainerId::from(id))
    }

    #[tokio::test]
    async fn guard_lists_scopes_in_canonical_order() {
        let queue = ScopeQueue::new(QueuePolicy::Wait);
        let guard = queue
            .acquire(&[entries("b"), Scope::Containers(ListId::from("l")), entries("a"), entries("b")])
            .await
            .unwrap();

        assert_eq!(
            guard.scopes(),
            &[Scope::Containers(ListId::from("l")), entries("a"), entries("b")]
        );
        assert!(queue.is_busy(&entries("a")));
        drop(guard);
        assert!(!queue.is_busy(&entries("a")));
    }

    #[tokio::test]
    async fn reject_policy_fails_on_held_scope() {
        let queue = ScopeQueue::new(QueuePolicy::Reject);
        let _held = queue.acquire(&[entries("a")]).await.unwrap();

        let err = queue.acquire(&[entries("b"), entries("a")]).await.unwrap_err();
        assert!(matches!(err, Error::Busy { scope } if scope == entries("a")));
        // the partially acquired scope was released again
        assert!(!queue.is_busy(&entries("b")));
    }

    #[tokio::test]
    async fn disjoint_scopes_do_not_block() {
        let queue = ScopeQueue::new(QueuePolicy::Wait);
        let _a = queue.acquire(&[entries("a")]).await.unwrap();
        let b = tokio::time::timeout(Duration::from_millis(100), queue.acquire(&[entries("b")])).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn list_guard_waits_for_every_scope_guard() {
        let queue = Arc::new(ScopeQueue::new(QueuePolicy::Wait));
        let held = queue.acquire(&[entries("b")]).await.unwrap();

        let refresh = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                let _list = queue.acquire_list().await;
            })
        };
        tokio::task::yield_now().await;
        assert!(!refresh.is_finished());

        drop(held);
        refresh.await.unwrap();
    }

    #[tokio::test]
    async fn reject_policy_fails_while_the_list_is_held() {
        let queue = ScopeQueue::new(QueuePolicy::Reject);
        let _list = queue.acquire_list().await;

        let err = queue.acquire(&[entries("a")]).await.unwrap_err();
        assert!(matches!(err, Error::Busy { scope } if scope == entries("a")));
    }

    #[tokio::test]
    async fn wait_policy_queues_until_release() {
        let queue = Arc::new(ScopeQueue::new(QueuePolicy::Wait));
        let first = queue.acquire(&[entries("a")]).await.unwrap();

        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.acquire(&[entries("a")]).await.map(|_| ()) })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(first);
        waiter.await.unwrap().unwrap();
    }
}
