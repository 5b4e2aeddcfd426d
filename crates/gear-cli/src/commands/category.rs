//! Category commands

use colored::Colorize;
use gear_order::MoveIntent;
use gear_sync::{MovePhase, MoveReport};

use crate::context::{Session, resolve_category};
use crate::error::{CliError, Result};

/// Append a category
pub async fn run_add_category(session: &Session, title: &str) -> Result<()> {
    let container = session.coordinator.add_container(title).await?;
    println!(
        "{} Added category {} at position {}",
        "OK".green().bold(),
        container.title.cyan(),
        container.position + 1
    );
    Ok(())
}

/// Remove a category with all of its items
pub async fn run_remove_category(session: &Session, category: &str) -> Result<()> {
    let state = session.state().await;
    let container_id = resolve_category(&state, category)?;
    let items = state.entries(&container_id).len();

    session.coordinator.remove_container(&container_id).await?;
    println!(
        "{} Removed category {} and {} items",
        "OK".green().bold(),
        category.cyan(),
        items
    );
    Ok(())
}

/// Rename a category
pub async fn run_rename_category(session: &Session, category: &str, title: &str) -> Result<()> {
    let state = session.state().await;
    let container_id = resolve_category(&state, category)?;

    session
        .coordinator
        .rename_container(&container_id, title)
        .await?;
    println!(
        "{} Renamed {} to {}",
        "OK".green().bold(),
        category.cyan(),
        title.trim().cyan()
    );
    Ok(())
}

/// Move a category to a 1-based position
pub async fn run_move_category(session: &Session, category: &str, position: usize) -> Result<()> {
    if position == 0 {
        return Err(CliError::user("Positions start at 1"));
    }
    let state = session.state().await;
    let container_id = resolve_category(&state, category)?;
    let from_index = state
        .container_index(&container_id)
        .ok_or_else(|| CliError::user(format!("No category named '{category}'")))?;

    let report = session
        .coordinator
        .plan_and_commit_move(MoveIntent::ReorderContainers {
            container_id,
            from_index,
            to_index: position - 1,
        })
        .await?;
    print_report(category, &report);
    Ok(())
}

/// Print the outcome of a committed move
pub(crate) fn print_report(subject: &str, report: &MoveReport) {
    match report.phase {
        MovePhase::Idle => println!("{} {} is already there", "OK".green().bold(), subject.cyan()),
        _ => println!(
            "{} Moved {} ({} writes)",
            "OK".green().bold(),
            subject.cyan(),
            report.writes_issued
        ),
    }
}
