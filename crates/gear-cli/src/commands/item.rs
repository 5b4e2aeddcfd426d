//! Item commands

use colored::Colorize;
use gear_order::Payload;
use gear_sync::adapters::{ManualMove, current_position, position_options};
use serde_json::Value;

use crate::commands::category::print_report;
use crate::context::{Session, resolve_category, resolve_item};
use crate::error::{CliError, Result};

/// Append an item to a category
pub async fn run_add_item(
    session: &Session,
    category: &str,
    name: &str,
    fields: &[(String, String)],
) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::user("Item name cannot be empty"));
    }
    let state = session.state().await;
    let container_id = resolve_category(&state, category)?;

    let mut payload = Payload::new();
    payload.insert("name".into(), Value::from(name));
    for (key, value) in fields {
        payload.insert(key.clone(), Value::from(value.as_str()));
    }

    let entry = session.coordinator.add_entry(&container_id, payload).await?;
    println!(
        "{} Added {} to {} at position {}",
        "OK".green().bold(),
        name.cyan(),
        category.cyan(),
        entry.position + 1
    );
    Ok(())
}

/// Remove an item
pub async fn run_remove_item(session: &Session, item: &str) -> Result<()> {
    let state = session.state().await;
    let entry_id = resolve_item(&state, item)?;

    session.coordinator.remove_entry(&entry_id).await?;
    println!("{} Removed {}", "OK".green().bold(), item.cyan());
    Ok(())
}

/// Move an item to a 1-based position, or list the positions on offer
pub async fn run_move_item(
    session: &Session,
    item: &str,
    position: Option<usize>,
    to: Option<&str>,
) -> Result<()> {
    let state = session.state().await;
    let entry_id = resolve_item(&state, item)?;
    let to_container_id = match to {
        Some(category) => resolve_category(&state, category)?,
        None => state
            .locate_entry(&entry_id)
            .map(|(container_id, _)| container_id.clone())
            .ok_or_else(|| CliError::user(format!("No item named '{item}'")))?,
    };

    let Some(position) = position else {
        let options = position_options(&state, &entry_id, &to_container_id)?;
        let current = current_position(&state, &entry_id)?;
        println!(
            "{} is at position {}. Available positions: {}-{}",
            item.cyan(),
            current,
            options.start(),
            options.end()
        );
        return Ok(());
    };

    let report = session
        .coordinator
        .commit_manual(&ManualMove {
            entry_id,
            to_container_id,
            position,
        })
        .await?;
    print_report(item, &report);
    Ok(())
}
