// src/engine/plan.rs

//! Explicit results of the Discover and Diff phases.
//!
//! Pending deletions travel next to the candidates instead of being smuggled
//! in as fake items.

use crate::cache::PathSet;
use crate::engine::report::Message;
use crate::project::UnitName;
use crate::resource::discovery::CandidateItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitStatus {
    /// Candidates were collected normally (possibly none).
    Ready,
    /// The unit could not be processed (missing output directory, bad
    /// pattern). It yields no candidates, no deletions and keeps its cache
    /// entry.
    Misconfigured,
}

#[derive(Debug, Clone)]
pub struct UnitDiscovery {
    pub unit: UnitName,
    pub status: UnitStatus,
    /// Declaration order, then traversal order.
    pub candidates: Vec<CandidateItem>,
}

/// Output of the Discover phase.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub units: Vec<UnitDiscovery>,
    pub messages: Vec<Message>,
}

impl Discovery {
    pub fn candidate_count(&self) -> usize {
        self.units.iter().map(|u| u.candidates.len()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct UnitPlan {
    pub unit: UnitName,
    pub status: UnitStatus,
    pub candidates: Vec<CandidateItem>,
    /// Output paths of this run's candidates. `None` for misconfigured units,
    /// whose cache entry must not be replaced.
    pub current: Option<PathSet>,
    /// Previously recorded outputs that no candidate produces any more.
    pub deletions: Vec<String>,
}

/// Output of the Diff phase: what Apply will do and what Persist will record.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub units: Vec<UnitPlan>,
    pub messages: Vec<Message>,
}

impl Plan {
    /// Aggregated deletion set, unit by unit.
    pub fn deletions(&self) -> impl Iterator<Item = &str> {
        self.units
            .iter()
            .flat_map(|u| u.deletions.iter().map(String::as_str))
    }

    /// All candidates in processing order.
    pub fn candidates(&self) -> impl Iterator<Item = &CandidateItem> {
        self.units.iter().flat_map(|u| u.candidates.iter())
    }

    pub fn unit(&self, name: &str) -> Option<&UnitPlan> {
        self.units.iter().find(|u| u.unit == name)
    }
}
