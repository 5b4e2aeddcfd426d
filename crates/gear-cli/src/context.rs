//! Opening a list file and resolving user input against it

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gear_order::{ContainerId, EntryId, ListId, ListState};
use gear_store::{JsonFileStore, ListRecord};
use gear_sync::{Coordinator, Settings, SettingsLayer};

use crate::error::{CliError, Result};

/// Settings file looked up next to the list file
const SETTINGS_FILE: &str = "gear.toml";

/// An opened list ready for commands
pub struct Session {
    pub record: ListRecord,
    pub coordinator: Coordinator<JsonFileStore>,
}

impl Session {
    /// Open `file` and load the selected list
    pub async fn open(file: &Path, list: Option<&str>, config: Option<&Path>) -> Result<Self> {
        let store = JsonFileStore::open(file)?;
        let record = select_list(store.lists()?, list)?;
        let settings = resolve_settings(file, config)?;
        tracing::debug!(list = %record.id, ?settings, "Opening list");

        let coordinator = Coordinator::load(Arc::new(store), record.id.clone(), &settings).await?;
        Ok(Self {
            record,
            coordinator,
        })
    }

    pub async fn state(&self) -> ListState {
        self.coordinator.snapshot().await
    }
}

/// Layer settings: defaults, then `gear.toml` beside the list file, then
/// the `--config` file
pub fn resolve_settings(file: &Path, config: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();

    let beside = sibling_settings(file);
    if beside.is_file() {
        settings.merge(&SettingsLayer::load(&beside)?);
    }
    if let Some(path) = config {
        settings.merge(&SettingsLayer::load(path)?);
    }
    settings.validate()?;
    Ok(settings)
}

fn sibling_settings(file: &Path) -> PathBuf {
    match file.parent() {
        Some(dir) => dir.join(SETTINGS_FILE),
        None => PathBuf::from(SETTINGS_FILE),
    }
}

fn select_list(lists: Vec<ListRecord>, query: Option<&str>) -> Result<ListRecord> {
    match query {
        Some(query) => lists
            .into_iter()
            .find(|l| l.id.as_str() == query || l.title.eq_ignore_ascii_case(query))
            .ok_or_else(|| CliError::user(format!("No list named '{query}'"))),
        None => {
            let mut lists = lists.into_iter();
            match (lists.next(), lists.next()) {
                (Some(only), None) => Ok(only),
                (None, _) => Err(CliError::user("The file holds no list; run `gear init`")),
                (Some(_), Some(_)) => Err(CliError::user(
                    "The file holds several lists; pick one with --list",
                )),
            }
        }
    }
}

/// Find a category by id or (case-insensitive) title
pub fn resolve_category(state: &ListState, query: &str) -> Result<ContainerId> {
    let containers = state.containers();
    if let Some(container) = containers.iter().find(|c| c.id.as_str() == query) {
        return Ok(container.id.clone());
    }
    let matches: Vec<_> = containers
        .iter()
        .filter(|c| c.title.eq_ignore_ascii_case(query))
        .collect();
    match matches.as_slice() {
        [only] => Ok(only.id.clone()),
        [] => Err(CliError::user(format!("No category named '{query}'"))),
        _ => Err(CliError::user(format!(
            "Several categories are named '{query}'; use the id instead"
        ))),
    }
}

/// Find an item by id or (case-insensitive) name
pub fn resolve_item(state: &ListState, query: &str) -> Result<EntryId> {
    let entries = state
        .containers()
        .iter()
        .flat_map(|c| state.entries(&c.id));
    let mut by_name = Vec::new();
    for entry in entries {
        if entry.id.as_str() == query {
            return Ok(entry.id.clone());
        }
        if entry.name().is_some_and(|name| name.eq_ignore_ascii_case(query)) {
            by_name.push(entry.id.clone());
        }
    }
    match by_name.len() {
        1 => Ok(by_name.remove(0)),
        0 => Err(CliError::user(format!("No item named '{query}'"))),
        _ => Err(CliError::user(format!(
            "Several items are named '{query}'; use the id instead"
        ))),
    }
}

/// List id shown to users
pub fn short_id(id: &ListId) -> &str {
    id.as_str().get(..8).unwrap_or(id.as_str())
}
