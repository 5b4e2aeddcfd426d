//! List builders for test scenarios.
//!
//! Layouts are written as `(container, "entry entry ...")` pairs; containers
//! and entries get positions from their order, and entries get a `name`
//! payload equal to their id.

use std::path::{Path, PathBuf};

use gear_order::{Container, Entry, ListId, ListState, Payload};
use gear_store::{JsonFileStore, ListDocument, MemoryStore};
use serde_json::Value;
use tempfile::TempDir;

/// List id used by every fixture
pub const LIST_ID: &str = "pct";

/// Build a contiguous list from a layout.
///
/// ```
/// use gear_test_utils::list_state;
///
/// let state = list_state(&[("sleep", "bag pad"), ("cook", "")]);
/// assert_eq!(state.entry_count(), 2);
/// assert!(state.is_valid());
/// ```
pub fn list_state(layout: &[(&str, &str)]) -> ListState {
    let mut containers = Vec::with_capacity(layout.len());
    let mut entries = Vec::new();
    for (position, (container, ids)) in layout.iter().enumerate() {
        containers.push(Container::new(
            *container,
            LIST_ID,
            title_case(container),
            position,
        ));
        for (index, id) in ids.split_whitespace().enumerate() {
            let mut payload = Payload::new();
            payload.insert("name".into(), Value::String(id.to_string()));
            entries.push(Entry::new(id, *container, index).with_payload(payload));
        }
    }
    ListState::from_parts(ListId::from(LIST_ID), containers, entries)
}

/// A small but realistic backpacking list
pub fn gear_list() -> ListState {
    list_state(&[
        ("sleep", "quilt pad pillow"),
        ("shelter", "tent stakes"),
        ("cook", "stove pot lighter spoon"),
        ("water", ""),
    ])
}

/// In-memory store seeded with a layout
pub fn memory_store(layout: &[(&str, &str)]) -> MemoryStore {
    MemoryStore::from_state(&list_state(layout))
}

/// Entry ids of one container in display order
pub fn entry_ids(state: &ListState, container: &str) -> Vec<String> {
    state
        .entries(&container.into())
        .iter()
        .map(|e| e.id.to_string())
        .collect()
}

fn title_case(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A temporary directory holding a JSON list file seeded with a layout.
pub struct TestListFile {
    temp_dir: TempDir,
    path: PathBuf,
}

impl TestListFile {
    pub fn new(layout: &[(&str, &str)]) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gear.json");
        let document = ListDocument::from_state(&list_state(layout), "PCT");
        std::fs::write(&path, serde_json::to_string_pretty(&document).unwrap()).unwrap();
        Self { temp_dir, path }
    }

    /// Directory containing the list file
    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> JsonFileStore {
        JsonFileStore::open(&self.path).expect("TestListFile::store: failed to open list file")
    }

    /// Current stored state of the fixture list
    pub fn state(&self) -> ListState {
        self.store().list_state(&ListId::from(LIST_ID)).unwrap()
    }
}
