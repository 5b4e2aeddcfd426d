//! Shared test utilities for the gear-order workspace.
//!
//! Dev-dependency only; never published.
//!
//! # Modules
//!
//! - [`fixtures`]: list builders from a compact text layout
//! - [`flaky`]: [`FlakyStore`], a persistence wrapper that injects failures
//!   and delays and records every call

pub mod fixtures;
pub mod flaky;

pub use fixtures::{LIST_ID, TestListFile, entry_ids, gear_list, list_state, memory_store};
pub use flaky::{Call, FlakyStore};
