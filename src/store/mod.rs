//! Persistent and in-memory state
//!
//! - `memory`: spoken key/value facts
//! - `watchdog`: last seen content hash per monitored page
//! - `context`: the most recent file, search and application
//! - `clipboard`: append-only clipboard archive
//!
//! The two JSON stores share one rule: a missing or unreadable file loads as
//! empty, and a failed save is logged without interrupting the assistant.

mod clipboard;
mod context;
mod json;
mod memory;
mod watchdog;

pub use clipboard::ClipboardArchive;
pub use context::{Context, FileReference};
pub use memory::{MemoryStore, parse_fact};
pub use watchdog::{WatchOutcome, WatchdogStore};
