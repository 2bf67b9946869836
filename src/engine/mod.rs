// src/engine/mod.rs

//! Incremental processing engine.
//!
//! A pass runs four phases strictly in order:
//! - **Discover**: collect candidates for every unit in scope.
//! - **Diff**: compare each unit's current outputs with the output cache to
//!   find obsolete files.
//! - **Apply**: delete obsolete outputs, then copy or filter each candidate.
//! - **Persist**: record the new per-unit outputs and save the cache.
//!
//! Nothing is persisted before the last phase, so an interrupted pass leaves
//! the previous cache authoritative.

pub mod cancel;
pub mod driver;
pub mod plan;
pub mod report;

pub use cancel::CancelFlag;
pub use driver::ProcessingDriver;
pub use plan::{Discovery, Plan, UnitDiscovery, UnitPlan, UnitStatus};
pub use report::{Message, RunOutcome, RunReport, Severity};
