//! Fault-injecting persistence wrapper.
//!
//! Realism level: the wrapped store is real, only the failures are staged.
//! A failing write is never forwarded, so the inner store keeps whatever the
//! earlier writes of the same plan produced.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use gear_order::{
    Container, ContainerId, ContainerWrite, Entry, EntryId, EntryWrite, ListId,
};
use gear_sync::{
    ContainerPatch, EntryPatch, NewContainer, NewEntry, PersistResult, Persistence,
    PersistenceError,
};

/// One recorded persistence call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    UpdateEntry { id: EntryId, patch: EntryPatch },
    UpdateContainer { id: ContainerId, patch: ContainerPatch },
    SetEntryPositions { container_id: ContainerId, writes: Vec<EntryWrite> },
    SetContainerPositions { list_id: ListId, writes: Vec<ContainerWrite> },
    CreateEntry { container_id: ContainerId, position: usize },
    DeleteEntry { id: EntryId },
    CreateContainer { title: String, position: usize },
    DeleteContainer { id: ContainerId },
    FetchEntries { container_id: ContainerId },
    FetchContainers { list_id: ListId },
}

impl Call {
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::FetchEntries { .. } | Self::FetchContainers { .. })
    }
}

/// Wraps a store, failing the N-th write and optionally delaying writes.
///
/// ```rust,no_run
/// use gear_sync::PersistenceError;
/// use gear_test_utils::{FlakyStore, memory_store};
///
/// let store = FlakyStore::new(memory_store(&[("a", "a0 a1")]))
///     .fail_on_write(2)
///     .failing_with(PersistenceError::rejected("quota"));
/// ```
pub struct FlakyStore<S> {
    inner: S,
    fail_on_write: Option<usize>,
    failure: PersistenceError,
    write_delay: Option<Duration>,
    batch: bool,
    fetch_failure: Mutex<Option<PersistenceError>>,
    writes: AtomicUsize,
    calls: Mutex<Vec<Call>>,
}

impl<S: Persistence> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        let batch = inner.supports_batch();
        Self {
            inner,
            fail_on_write: None,
            failure: PersistenceError::unavailable("injected failure"),
            write_delay: None,
            batch,
            fetch_failure: Mutex::new(None),
            writes: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail the `n`-th write (1-based); later writes go through again
    pub fn fail_on_write(mut self, n: usize) -> Self {
        self.fail_on_write = Some(n);
        self
    }

    pub fn failing_with(mut self, failure: PersistenceError) -> Self {
        self.failure = failure;
        self
    }

    /// Sleep before every write; pair with a short write timeout
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    /// Advertise (or hide) native batch support
    pub fn with_batch(mut self, batch: bool) -> Self {
        self.batch = batch;
        self
    }

    /// Make every following fetch fail until cleared with `None`
    pub fn set_fetch_failure(&self, failure: Option<PersistenceError>) {
        *self.fetch_failure.lock().unwrap_or_else(PoisonError::into_inner) = failure;
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Recorded write calls, fetches excluded
    pub fn write_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_write).collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn record(&self, call: Call) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    async fn before_write(&self, call: Call) -> PersistResult<()> {
        self.record(call);
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        let n = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_write == Some(n) {
            return Err(self.failure.clone());
        }
        Ok(())
    }

    fn before_fetch(&self, call: Call) -> PersistResult<()> {
        self.record(call);
        match &*self.fetch_failure.lock().unwrap_or_else(PoisonError::into_inner) {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<S: Persistence> Persistence for FlakyStore<S> {
    async fn update_entry(&self, id: &EntryId, patch: EntryPatch) -> PersistResult<()> {
        self.before_write(Call::UpdateEntry {
            id: id.clone(),
            patch: patch.clone(),
        })
        .await?;
        self.inner.update_entry(id, patch).await
    }

    async fn update_container(
        &self,
        id: &ContainerId,
        patch: ContainerPatch,
    ) -> PersistResult<()> {
        self.before_write(Call::UpdateContainer {
            id: id.clone(),
            patch: patch.clone(),
        })
        .await?;
        self.inner.update_container(id, patch).await
    }

    async fn fetch_entries(&self, container_id: &ContainerId) -> PersistResult<Vec<Entry>> {
        self.before_fetch(Call::FetchEntries {
            container_id: container_id.clone(),
        })?;
        self.inner.fetch_entries(container_id).await
    }

    async fn fetch_containers(&self, list_id: &ListId) -> PersistResult<Vec<Container>> {
        self.before_fetch(Call::FetchContainers {
            list_id: list_id.clone(),
        })?;
        self.inner.fetch_containers(list_id).await
    }

    async fn create_entry(&self, entry: NewEntry) -> PersistResult<Entry> {
        self.before_write(Call::CreateEntry {
            container_id: entry.container_id.clone(),
            position: entry.position,
        })
        .await?;
        self.inner.create_entry(entry).await
    }

    async fn delete_entry(&self, id: &EntryId) -> PersistResult<()> {
        self.before_write(Call::DeleteEntry { id: id.clone() }).await?;
        self.inner.delete_entry(id).await
    }

    async fn create_container(&self, container: NewContainer) -> PersistResult<Container> {
        self.before_write(Call::CreateContainer {
            title: container.title.clone(),
            position: container.position,
        })
        .await?;
        self.inner.create_container(container).await
    }

    async fn delete_container(&self, id: &ContainerId) -> PersistResult<()> {
        self.before_write(Call::DeleteContainer { id: id.clone() })
            .await?;
        self.inner.delete_container(id).await
    }

    fn supports_batch(&self) -> bool {
        self.batch
    }

    async fn set_entry_positions(
        &self,
        container_id: &ContainerId,
        writes: &[EntryWrite],
    ) -> PersistResult<()> {
        self.before_write(Call::SetEntryPositions {
            container_id: container_id.clone(),
            writes: writes.to_vec(),
        })
        .await?;
        self.inner.set_entry_positions(container_id, writes).await
    }

    async fn set_container_positions(
        &self,
        list_id: &ListId,
        writes: &[ContainerWrite],
    ) -> PersistResult<()> {
        self.before_write(Call::SetContainerPositions {
            list_id: list_id.clone(),
            writes: writes.to_vec(),
        })
        .await?;
        self.inner.set_container_positions(list_id, writes).await
    }
}
