//! Init command

use std::path::Path;

use colored::Colorize;
use gear_store::JsonFileStore;

use crate::context::short_id;
use crate::error::{CliError, Result};

/// Create the list file if needed and add a list to it
pub fn run_init(file: &Path, title: &str) -> Result<()> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CliError::user("List title cannot be empty"));
    }
    let store = if file.exists() {
        JsonFileStore::open(file)?
    } else {
        JsonFileStore::create(file)?
    };
    let record = store.create_list(title)?;
    tracing::info!(list = %record.id, path = ?file, "Initialised list");

    println!(
        "{} Created list {} ({}) in {}",
        "=>".blue().bold(),
        record.title.bold(),
        short_id(&record.id).dimmed(),
        file.display()
    );
    Ok(())
}
