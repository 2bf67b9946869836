// src/cache/mod.rs

//! Persistent record of which outputs each unit produced last time.
//!
//! The driver diffs the current run's output paths against this record to
//! find obsolete outputs, then replaces each unit's entry wholesale. The
//! file is only written at the end of a completed pass, so a crash or
//! cancellation leaves the previous snapshot in place.

pub mod codec;
pub mod path_set;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::project::UnitName;
use crate::types::CaseSensitivity;

pub use codec::{CacheDecodeError, FORMAT_VERSION};
pub use path_set::PathSet;

/// Default cache directory, relative to the project root.
pub const DEFAULT_CACHE_DIR: &str = ".resflow";

/// Cache file for a project inside `cache_dir`.
///
/// The name is derived from the project root so several projects can share
/// one cache directory.
pub fn cache_file_for(cache_dir: &Path, project_root: &Path) -> PathBuf {
    let location = project_root.to_string_lossy();
    let hash = blake3::hash(location.as_bytes()).to_hex();
    cache_dir.join(format!("outputs-{}.bin", &hash[..16]))
}

/// Unit name -> output paths produced on the last completed run.
pub struct OutputCache {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    sensitivity: CaseSensitivity,
    entries: BTreeMap<UnitName, PathSet>,
}

impl std::fmt::Debug for OutputCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputCache")
            .field("path", &self.path)
            .field("sensitivity", &self.sensitivity)
            .field("units", &self.entries.len())
            .finish()
    }
}

impl OutputCache {
    /// Empty cache that will be saved to `path`.
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>, sensitivity: CaseSensitivity) -> Self {
        Self {
            fs,
            path: path.into(),
            sensitivity: sensitivity.resolve(),
            entries: BTreeMap::new(),
        }
    }

    /// Load the cache stored at `path`.
    ///
    /// A missing, unreadable, truncated or foreign-version file yields an
    /// empty cache: the next run behaves like a first run and deletes nothing.
    pub fn load(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>, sensitivity: CaseSensitivity) -> Self {
        let mut cache = Self::new(fs, path, sensitivity);

        if !cache.fs.exists(&cache.path) {
            debug!(path = ?cache.path, "no output cache yet; starting cold");
            return cache;
        }

        let bytes = match cache.fs.read(&cache.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = ?cache.path, error = %e, "cannot read output cache; starting cold");
                return cache;
            }
        };

        match codec::decode(&bytes, cache.sensitivity) {
            Ok(entries) => {
                debug!(path = ?cache.path, units = entries.len(), "loaded output cache");
                cache.entries = entries;
            }
            Err(e) => {
                warn!(path = ?cache.path, error = %e, "discarding output cache; starting cold");
            }
        }

        cache
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sensitivity(&self) -> CaseSensitivity {
        self.sensitivity
    }

    pub fn get(&self, unit: &str) -> Option<&PathSet> {
        self.entries.get(unit)
    }

    pub fn units(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the entry for `unit` and return the previous one.
    pub fn snapshot(&mut self, unit: &str, outputs: PathSet) -> Option<PathSet> {
        let outputs = if outputs.sensitivity() == self.sensitivity {
            outputs
        } else {
            outputs.with_sensitivity(self.sensitivity)
        };
        self.entries.insert(unit.to_string(), outputs)
    }

    /// Drop entries for units that no longer exist. Returns the removed names.
    pub fn prune_unknown_units<'a, I>(&mut self, existing: I) -> Vec<UnitName>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let existing: std::collections::HashSet<&str> = existing.into_iter().collect();
        let stale: Vec<UnitName> = self
            .entries
            .keys()
            .filter(|k| !existing.contains(k.as_str()))
            .cloned()
            .collect();

        for unit in &stale {
            self.entries.remove(unit);
        }
        if !stale.is_empty() {
            debug!(removed = ?stale, "pruned output cache entries for unknown units");
        }
        stale
    }

    /// Write the cache to disk.
    ///
    /// The bytes go to a temporary sibling that is then renamed over the
    /// target, so readers see either the old or the new file. A torn
    /// temporary file never replaces a good one, and a torn target fails the
    /// checksum on load.
    pub fn save(&self) -> Result<()> {
        let bytes = codec::encode(&self.entries);
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "outputs".to_owned());
        let tmp_path = self.path.with_file_name(format!(".{file_name}.tmp"));

        self.fs
            .write(&tmp_path, &bytes)
            .with_context(|| format!("writing output cache to {:?}", tmp_path))?;
        self.fs
            .rename(&tmp_path, &self.path)
            .with_context(|| format!("replacing output cache at {:?}", self.path))?;

        debug!(path = ?self.path, units = self.entries.len(), bytes = bytes.len(), "saved output cache");
        Ok(())
    }
}
