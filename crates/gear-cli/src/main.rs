//! Gear CLI
//!
//! Keeps packing lists in order: categories of items, each sequence
//! positioned contiguously, edited through the sync coordinator.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use context::Session;
use error::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Init { title } = &cli.command {
        return commands::run_init(&cli.file, title);
    }

    let session = Session::open(&cli.file, cli.list.as_deref(), cli.config.as_deref()).await?;
    execute_command(&session, cli.command).await
}

/// Logs go to stderr so `show --json` output stays parseable
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
    tracing::debug!("Verbose mode enabled");
}

async fn execute_command(session: &Session, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init { .. } => Ok(()),
        Commands::Show { json } => commands::run_show(session, json).await,
        Commands::AddCategory { title } => commands::run_add_category(session, &title).await,
        Commands::RemoveCategory { category } => {
            commands::run_remove_category(session, &category).await
        }
        Commands::RenameCategory { category, title } => {
            commands::run_rename_category(session, &category, &title).await
        }
        Commands::AddItem {
            category,
            name,
            fields,
        } => commands::run_add_item(session, &category, &name, &fields).await,
        Commands::RemoveItem { item } => commands::run_remove_item(session, &item).await,
        Commands::MoveItem { item, position, to } => {
            commands::run_move_item(session, &item, position, to.as_deref()).await
        }
        Commands::MoveCategory { category, position } => {
            commands::run_move_category(session, &category, position).await
        }
        Commands::Reindex => commands::run_reindex(session).await,
    }
}
