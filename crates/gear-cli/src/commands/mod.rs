//! Command implementations for gear-cli

pub mod category;
pub mod init;
pub mod item;
pub mod reindex;
pub mod show;

pub use category::{run_add_category, run_move_category, run_remove_category, run_rename_category};
pub use init::run_init;
pub use item::{run_add_item, run_move_item, run_remove_item};
pub use reindex::run_reindex;
pub use show::run_show;
