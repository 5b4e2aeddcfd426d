//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Gear - keep packing lists in order
#[derive(Parser, Debug)]
#[command(name = "gear")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file layered over `gear.toml` next to the list file
    #[arg(long, global = true, env = "GEAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// List file to operate on
    #[arg(short, long, global = true, env = "GEAR_FILE", default_value = "gear.json")]
    pub file: PathBuf,

    /// List id or title when the file holds more than one list
    #[arg(short, long, global = true)]
    pub list: Option<String>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create a new list file, or add a list to an existing one
    Init {
        /// Title of the new list
        #[arg(short, long, default_value = "Gear list")]
        title: String,
    },

    /// Print the list
    Show {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Append a category to the list
    AddCategory {
        /// Category title
        title: String,
    },

    /// Delete a category and every item in it
    RemoveCategory {
        /// Category id or title
        category: String,
    },

    /// Rename a category
    RenameCategory {
        /// Category id or title
        category: String,
        /// New title
        title: String,
    },

    /// Append an item to a category
    AddItem {
        /// Category id or title
        category: String,
        /// Item name
        name: String,
        /// Extra fields stored with the item
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },

    /// Delete an item
    RemoveItem {
        /// Item id or name
        item: String,
    },

    /// Move an item to a position, optionally in another category
    ///
    /// Positions start at 1. Without a position the available ones are listed.
    ///
    /// Examples:
    ///   gear move-item stove 1             # first in its own category
    ///   gear move-item stove 3 --to Kitchen  # third in another category
    ///   gear move-item stove --to Kitchen    # show positions in Kitchen
    MoveItem {
        /// Item id or name
        item: String,
        /// Target position (1-based)
        position: Option<usize>,
        /// Target category id or title (defaults to the item's own)
        #[arg(long)]
        to: Option<String>,
    },

    /// Move a category to a position (1-based)
    MoveCategory {
        /// Category id or title
        category: String,
        /// Target position (1-based)
        position: usize,
    },

    /// Rewrite stored positions so every sequence is contiguous again
    Reindex,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}
