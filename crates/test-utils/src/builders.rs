#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use resflow::cache::OutputCache;
use resflow::engine::ProcessingDriver;
use resflow::fs::FileSystem;
use resflow::project::{BuildUnit, Project, ResourceRoot};
use resflow::types::CaseSensitivity;

/// Builder for `BuildUnit` to simplify test setup.
pub struct UnitBuilder {
    unit: BuildUnit,
}

impl UnitBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            unit: BuildUnit::new(name),
        }
    }

    pub fn output(mut self, dir: impl Into<PathBuf>) -> Self {
        self.unit.output_dir = Some(dir.into());
        self
    }

    pub fn test_output(mut self, dir: impl Into<PathBuf>) -> Self {
        self.unit.test_output_dir = Some(dir.into());
        self
    }

    /// Plain-copy root selecting everything.
    pub fn copy_root(self, dir: impl Into<PathBuf>) -> Self {
        self.resource(ResourceRoot::new(dir))
    }

    /// Filtered root selecting everything.
    pub fn filtered_root(self, dir: impl Into<PathBuf>) -> Self {
        self.resource(ResourceRoot::new(dir).filtering(true))
    }

    pub fn resource(mut self, root: ResourceRoot) -> Self {
        self.unit.resources.push(root);
        self
    }

    pub fn test_resource(mut self, root: ResourceRoot) -> Self {
        self.unit.test_resources.push(root);
        self
    }

    pub fn filter_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.unit.filters.push(path.into());
        self
    }

    pub fn property(mut self, key: &str, value: &str) -> Self {
        self.unit.properties.insert(key, value);
        self
    }

    pub fn build(self) -> BuildUnit {
        self.unit
    }
}

/// Project rooted at `root` with the given units.
pub fn project(root: impl Into<PathBuf>, units: Vec<BuildUnit>) -> Project {
    units
        .into_iter()
        .fold(Project::new(root), |project, unit| project.with_unit(unit))
}

/// Driver with a freshly loaded cache at `cache_path`.
pub fn driver(
    fs: Arc<dyn FileSystem>,
    cache_path: impl Into<PathBuf>,
    sensitivity: CaseSensitivity,
) -> ProcessingDriver {
    let cache = OutputCache::load(fs.clone(), cache_path, sensitivity);
    ProcessingDriver::new(fs, cache)
}
