// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cache::{cache_file_for, DEFAULT_CACHE_DIR};
use crate::project::{BuildUnit, Project, ResourceRoot};
use crate::resource::filter::{Charset, DefaultCharsetResolver};
use crate::types::CaseSensitivity;

/// Top-level project file as read from TOML, before validation.
///
/// ```toml
/// [project]
/// case_sensitivity = "auto"
///
/// [unit.core]
/// output = "out/core"
/// filters = ["filters/dev.properties"]
/// properties = { name = "Widget" }
///
/// [[unit.core.resources]]
/// directory = "core/src/main/resources"
/// filtering = true
/// includes = ["**/*.properties"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Project-wide settings from `[project]`.
    #[serde(default)]
    pub project: ProjectSection,

    /// All units from `[unit.<name>]`, keyed by unit name.
    #[serde(default)]
    pub unit: BTreeMap<String, UnitConfig>,
}

/// A validated project file.
///
/// Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub project: ProjectSection,
    pub unit: BTreeMap<String, UnitConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(project: ProjectSection, unit: BTreeMap<String, UnitConfig>) -> Self {
        Self { project, unit }
    }

    pub fn units(&self) -> &BTreeMap<String, UnitConfig> {
        &self.unit
    }

    /// Build the engine's project model, resolving relative paths against `root`.
    ///
    /// Units are ordered by name.
    pub fn to_project(&self, root: &Path) -> Project {
        let mut project = Project::new(root);
        for (name, unit) in &self.unit {
            project.units.push(unit.to_build_unit(name, root));
        }
        project
    }

    /// Where this project's output cache lives.
    pub fn cache_file(&self, root: &Path) -> PathBuf {
        let dir = match &self.project.cache_dir {
            Some(dir) => resolve(root, dir),
            None => root.join(DEFAULT_CACHE_DIR),
        };
        cache_file_for(&dir, root)
    }

    pub fn charset_resolver(&self) -> DefaultCharsetResolver {
        DefaultCharsetResolver {
            encoding: self.project.encoding.clone(),
            properties_encoding: self.project.properties_encoding.clone(),
        }
    }
}

/// `[project]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    /// Directory holding the output cache. Default: `.resflow` under the
    /// project root.
    #[serde(default)]
    pub cache_dir: Option<String>,

    /// `"auto"` (default), `"sensitive"` or `"insensitive"`.
    #[serde(default)]
    pub case_sensitivity: CaseSensitivity,

    /// Charset for filtered files other than `*.properties`.
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Charset for filtered `*.properties` files.
    #[serde(default = "default_properties_encoding")]
    pub properties_encoding: String,
}

fn default_encoding() -> String {
    Charset::Utf8.name().to_string()
}

fn default_properties_encoding() -> String {
    Charset::Latin1.name().to_string()
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            cache_dir: None,
            case_sensitivity: CaseSensitivity::default(),
            encoding: default_encoding(),
            properties_encoding: default_properties_encoding(),
        }
    }
}

/// `[unit.<name>]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UnitConfig {
    /// Output directory for `resources`.
    ///
    /// Leaving it out while declaring resources is reported when the unit
    /// is processed; other units are unaffected.
    #[serde(default)]
    pub output: Option<String>,

    /// Output directory for `test_resources`.
    #[serde(default)]
    pub test_output: Option<String>,

    #[serde(default)]
    pub resources: Vec<ResourceConfig>,

    #[serde(default)]
    pub test_resources: Vec<ResourceConfig>,

    /// `.properties` files whose entries feed filtering, later files win.
    #[serde(default)]
    pub filters: Vec<String>,

    /// Inline properties, overridden by `filters`.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl UnitConfig {
    fn to_build_unit(&self, name: &str, root: &Path) -> BuildUnit {
        let mut unit = BuildUnit::new(name);
        unit.output_dir = self.output.as_deref().map(|p| resolve(root, p));
        unit.test_output_dir = self.test_output.as_deref().map(|p| resolve(root, p));
        unit.resources = self.resources.iter().map(|r| r.to_root(root)).collect();
        unit.test_resources = self.test_resources.iter().map(|r| r.to_root(root)).collect();
        unit.filters = self.filters.iter().map(|p| resolve(root, p)).collect();
        unit.properties = self
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        unit
    }
}

/// One `[[unit.<name>.resources]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    pub directory: String,

    #[serde(default)]
    pub filtering: bool,

    /// Default: everything (`**/*`).
    #[serde(default)]
    pub includes: Vec<String>,

    /// Default: nothing.
    #[serde(default)]
    pub excludes: Vec<String>,
}

impl ResourceConfig {
    fn to_root(&self, root: &Path) -> ResourceRoot {
        ResourceRoot {
            directory: resolve(root, &self.directory),
            filtering: self.filtering,
            includes: self.includes.clone(),
            excludes: self.excludes.clone(),
        }
    }
}

fn resolve(root: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}
