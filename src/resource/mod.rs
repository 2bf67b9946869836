// src/resource/mod.rs

//! Resource selection and per-file processing inputs.
//!
//! This module is responsible for:
//! - Compiling include/exclude patterns per resource root.
//! - Walking resource roots and turning matches into [`CandidateItem`]s.
//! - Property sets, filter files and the substitution/charset seams.
//! - Validity fingerprints for deciding whether an item is stale.
//!
//! It does **not** know about the output cache or deletions; that is the
//! engine's job.

pub mod discovery;
pub mod filter;
pub mod patterns;
pub mod properties;
pub mod validity;

pub use discovery::{collect_candidates, CandidateItem, RootSpec};
pub use filter::{Charset, CharsetResolver, DefaultCharsetResolver, PlaceholderFilter, TextFilter};
pub use patterns::PatternMatcher;
pub use properties::{load_filters, parse_properties, PropertySet};
pub use validity::{AlwaysReprocess, InMemoryValidity, ValidityState, ValidityTracker};
