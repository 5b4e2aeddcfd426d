//! JSON-file store
//!
//! One document per file. Every mutation reads the document, changes it and
//! writes it back to a temporary file that is then renamed over the original,
//! all under an exclusive lock on a sidecar `.lock` file so that concurrent
//! processes never interleave their read-modify-write cycles.
//!
//! The [`Persistence`] methods run that I/O on the blocking pool, since
//! waiting on another process's lock can take arbitrarily long.

use std::fs::{self, File, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use fs2::FileExt;
use gear_order::{
    Container, ContainerId, ContainerWrite, Entry, EntryId, EntryWrite, ListId, ListState,
};
use gear_sync::{
    ContainerPatch, EntryPatch, NewContainer, NewEntry, PersistResult, Persistence,
};

use crate::document::{ListDocument, ListRecord};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a new list file holding an empty document
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self { path: path.into() };
        if store.path.exists() {
            return Err(Error::AlreadyExists { path: store.path });
        }
        let _lock = store.lock_exclusive()?;
        store.write(&mut ListDocument::new())?;
        tracing::info!(path = ?store.path, "Created list file");
        Ok(store)
    }

    /// Open an existing list file
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self { path: path.into() };
        store.read()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document
    pub fn load(&self) -> Result<ListDocument> {
        self.read()
    }

    pub fn lists(&self) -> Result<Vec<ListRecord>> {
        Ok(self.read()?.lists)
    }

    pub fn create_list(&self, title: &str) -> Result<ListRecord> {
        self.transact(|doc| Ok(doc.add_list(title)))
    }

    /// The list as a fresh fetch would see it
    pub fn list_state(&self, list_id: &ListId) -> Result<ListState> {
        self.read()?.list_state(list_id)
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn lock_file(&self) -> Result<File> {
        Ok(OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())?)
    }

    fn lock_exclusive(&self) -> Result<File> {
        let file = self.lock_file()?;
        file.lock_exclusive()?;
        Ok(file)
    }

    fn read(&self) -> Result<ListDocument> {
        let lock = self.lock_file()?;
        lock.lock_shared()?;
        self.read_unlocked()
    }

    fn read_unlocked(&self) -> Result<ListDocument> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::MissingFile {
                    path: self.path.clone(),
                });
            }
            Err(err) => return Err(err.into()),
        };
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        let document: ListDocument = serde_json::from_str(&content)?;
        document.check_version()?;
        Ok(document)
    }

    fn write(&self, document: &mut ListDocument) -> Result<()> {
        document.saved_at = Utc::now();
        let content = serde_json::to_string_pretty(document)?;
        let temp_path = self.temp_path();
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    /// Run file I/O and lock waits on the blocking pool so they never stall
    /// the runtime's worker threads.
    async fn off_thread<T, F>(&self, job: F) -> PersistResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&JsonFileStore) -> Result<T> + Send + 'static,
    {
        let store = self.clone();
        let value = tokio::task::spawn_blocking(move || job(&store))
            .await
            .map_err(Error::from)??;
        Ok(value)
    }

    /// Read, mutate and write back under one exclusive lock.
    ///
    /// The file is left untouched when `change` fails.
    fn transact<T>(&self, change: impl FnOnce(&mut ListDocument) -> Result<T>) -> Result<T> {
        let _lock = self.lock_exclusive()?;
        let mut document = self.read_unlocked()?;
        let value = change(&mut document)?;
        self.write(&mut document)?;
        Ok(value)
    }
}

#[async_trait]
impl Persistence for JsonFileStore {
    async fn update_entry(&self, id: &EntryId, patch: EntryPatch) -> PersistResult<()> {
        let id = id.clone();
        self.off_thread(move |store| store.transact(|doc| doc.update_entry(&id, &patch)))
            .await
    }

    async fn update_container(
        &self,
        id: &ContainerId,
        patch: ContainerPatch,
    ) -> PersistResult<()> {
        let id = id.clone();
        self.off_thread(move |store| store.transact(|doc| doc.update_container(&id, &patch)))
            .await
    }

    async fn fetch_entries(&self, container_id: &ContainerId) -> PersistResult<Vec<Entry>> {
        let container_id = container_id.clone();
        self.off_thread(move |store| store.read()?.entries_of(&container_id))
            .await
    }

    async fn fetch_containers(&self, list_id: &ListId) -> PersistResult<Vec<Container>> {
        let list_id = list_id.clone();
        self.off_thread(move |store| store.read()?.containers_of(&list_id))
            .await
    }

    async fn create_entry(&self, entry: NewEntry) -> PersistResult<Entry> {
        self.off_thread(move |store| store.transact(|doc| doc.insert_entry(entry)))
            .await
    }

    async fn delete_entry(&self, id: &EntryId) -> PersistResult<()> {
        let id = id.clone();
        self.off_thread(move |store| store.transact(|doc| doc.remove_entry(&id)).map(drop))
            .await
    }

    async fn create_container(&self, container: NewContainer) -> PersistResult<Container> {
        self.off_thread(move |store| store.transact(|doc| doc.insert_container(container)))
            .await
    }

    async fn delete_container(&self, id: &ContainerId) -> PersistResult<()> {
        let target = id.clone();
        let removed = self
            .off_thread(move |store| store.transact(|doc| doc.remove_container(&target)))
            .await?;
        tracing::debug!(container = %id, entries = removed, "Deleted container");
        Ok(())
    }

    fn supports_batch(&self) -> bool {
        true
    }

    async fn set_entry_positions(
        &self,
        container_id: &ContainerId,
        writes: &[EntryWrite],
    ) -> PersistResult<()> {
        let container_id = container_id.clone();
        let writes = writes.to_vec();
        self.off_thread(move |store| {
            store.transact(|doc| doc.set_entry_positions(&container_id, &writes))
        })
        .await
    }

    async fn set_container_positions(
        &self,
        list_id: &ListId,
        writes: &[ContainerWrite],
    ) -> PersistResult<()> {
        let list_id = list_id.clone();
        let writes = writes.to_vec();
        self.off_thread(move |store| {
            store.transact(|doc| doc.set_container_positions(&list_id, &writes))
        })
        .await
    }
}
