// src/watch/mod.rs

//! Watch mode: re-run processing when resources or filter files change.
//!
//! This module only turns filesystem notifications (`notify`) into batches of
//! relevant paths; the caller decides when to run the next pass.

pub mod scope;
pub mod watcher;

pub use scope::{WatchScope, WatchTarget};
pub use watcher::{spawn_watcher, ChangeBatch, WatcherHandle};
