//! Persistence backends for gear lists
//!
//! Both stores implement [`gear_sync::Persistence`] over the same flat
//! [`ListDocument`] of lists, containers and entries:
//!
//! - [`MemoryStore`] keeps the document in memory
//! - [`JsonFileStore`] keeps it in a JSON file, rewritten atomically on every
//!   change

mod document;
mod error;
mod file;
mod memory;

pub use document::{FORMAT_VERSION, ListDocument, ListRecord};
pub use error::{Error, Result};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
