// src/project.rs

//! In-memory project model handed to the engine.
//!
//! The engine does not care where units come from. The CLI builds a
//! [`Project`] from `Resflow.toml` (see [`crate::config`]); hosts embedding the
//! library can build one directly.

use std::path::{Path, PathBuf};

use crate::resource::properties::PropertySet;
use crate::types::ResourceScope;

/// Canonical build unit name type used throughout the engine.
pub type UnitName = String;

/// One declared resource root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRoot {
    pub directory: PathBuf,
    pub filtering: bool,
    /// Empty means "everything" (`**/*`).
    pub includes: Vec<String>,
    /// Empty means "nothing excluded".
    pub excludes: Vec<String>,
}

impl ResourceRoot {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            filtering: false,
            includes: Vec::new(),
            excludes: Vec::new(),
        }
    }

    pub fn filtering(mut self, filtering: bool) -> Self {
        self.filtering = filtering;
        self
    }

    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.includes.push(pattern.into());
        self
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.push(pattern.into());
        self
    }
}

/// A module whose resources are processed and whose outputs are tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildUnit {
    pub name: UnitName,
    pub output_dir: Option<PathBuf>,
    pub test_output_dir: Option<PathBuf>,
    pub resources: Vec<ResourceRoot>,
    pub test_resources: Vec<ResourceRoot>,
    /// Property files merged after `properties`, in order.
    pub filters: Vec<PathBuf>,
    /// Properties resolved by the host before the run.
    pub properties: PropertySet,
}

impl BuildUnit {
    pub fn new(name: impl Into<UnitName>) -> Self {
        Self {
            name: name.into(),
            output_dir: None,
            test_output_dir: None,
            resources: Vec::new(),
            test_resources: Vec::new(),
            filters: Vec::new(),
            properties: PropertySet::new(),
        }
    }

    /// Output directory for a scope, if declared.
    pub fn output_for(&self, scope: ResourceScope) -> Option<&Path> {
        match scope {
            ResourceScope::Main => self.output_dir.as_deref(),
            ResourceScope::Test => self.test_output_dir.as_deref(),
        }
    }

    pub fn resources_for(&self, scope: ResourceScope) -> &[ResourceRoot] {
        match scope {
            ResourceScope::Main => &self.resources,
            ResourceScope::Test => &self.test_resources,
        }
    }

    /// Scopes that declare resources but have no output directory.
    pub fn missing_outputs(&self) -> Vec<ResourceScope> {
        [ResourceScope::Main, ResourceScope::Test]
            .into_iter()
            .filter(|&scope| {
                !self.resources_for(scope).is_empty() && self.output_for(scope).is_none()
            })
            .collect()
    }
}

/// The full set of units known to the host, plus where its cache lives.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub units: Vec<BuildUnit>,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            units: Vec::new(),
        }
    }

    pub fn with_unit(mut self, unit: BuildUnit) -> Self {
        self.units.push(unit);
        self
    }

    pub fn unit(&self, name: &str) -> Option<&BuildUnit> {
        self.units.iter().find(|u| u.name == name)
    }

    pub fn unit_names(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(|u| u.name.as_str())
    }
}

/// Which units a single run covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RunScope {
    /// Every unit of the project.
    #[default]
    All,
    /// Only the named units. Others keep their recorded outputs.
    Units(Vec<UnitName>),
}

impl RunScope {
    pub fn from_names(names: Vec<UnitName>) -> Self {
        if names.is_empty() {
            RunScope::All
        } else {
            RunScope::Units(names)
        }
    }

    pub fn contains(&self, unit: &str) -> bool {
        match self {
            RunScope::All => true,
            RunScope::Units(names) => names.iter().any(|n| n == unit),
        }
    }
}
