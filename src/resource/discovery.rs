// src/resource/discovery.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::engine::cancel::CancelFlag;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::project::UnitName;
use crate::resource::patterns::PatternMatcher;
use crate::resource::properties::PropertySet;
use crate::resource::validity::ValidityState;

/// One file slated for copy or filter in the current run.
///
/// Built during discovery and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct CandidateItem {
    unit: UnitName,
    source: PathBuf,
    output: String,
    filtered: bool,
    properties: Arc<PropertySet>,
    validity: ValidityState,
}

impl CandidateItem {
    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn source_path(&self) -> &Path {
        &self.source
    }

    /// Output location as recorded in the output cache.
    pub fn output_path(&self) -> &str {
        &self.output
    }

    pub fn is_filtered(&self) -> bool {
        self.filtered
    }

    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }

    pub fn validity_state(&self) -> ValidityState {
        self.validity
    }
}

/// Everything discovery needs to know about one resource root.
#[derive(Debug)]
pub struct RootSpec<'a> {
    pub unit: &'a str,
    pub root: &'a Path,
    pub destination: &'a Path,
    pub matcher: &'a PatternMatcher,
    pub filtering: bool,
    pub properties: &'a Arc<PropertySet>,
    pub properties_hash: u64,
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Returns `None` if `path` is not below `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

/// `destination + "/" + rel_path`, without doubling the separator.
pub fn output_path_for(destination: &Path, rel_path: &str) -> String {
    let dest = destination.to_string_lossy().replace('\\', "/");
    let dest = dest.trim_end_matches('/');
    if dest.is_empty() {
        format!("/{rel_path}")
    } else {
        format!("{dest}/{rel_path}")
    }
}

/// Collect candidates for every matching file under `spec.root`.
///
/// Directories are always descended into; patterns only decide about
/// files. Entries are visited in file-name order and subdirectories are
/// walked where they sort, so the result order is reproducible.
///
/// Polls `cancel` once per directory and once per file. On cancellation the
/// partial result is dropped and `Err(Cancelled)` is returned. A directory
/// that cannot be listed fails the whole root: a partial listing would make
/// the unlisted outputs look obsolete.
pub fn collect_candidates(
    fs: &dyn FileSystem,
    spec: &RootSpec<'_>,
    cancel: &CancelFlag,
) -> Result<Vec<CandidateItem>> {
    let mut out = Vec::new();

    if !fs.is_dir(spec.root) {
        debug!(unit = spec.unit, root = ?spec.root, "resource root does not exist; skipping");
        return Ok(out);
    }

    walk(fs, spec, spec.root, cancel, &mut out)?;

    debug!(
        unit = spec.unit,
        root = ?spec.root,
        count = out.len(),
        "collected resource candidates"
    );
    Ok(out)
}

fn walk(
    fs: &dyn FileSystem,
    spec: &RootSpec<'_>,
    dir: &Path,
    cancel: &CancelFlag,
    out: &mut Vec<CandidateItem>,
) -> Result<()> {
    cancel.check()?;

    let mut entries = fs.read_dir(dir)?;
    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    for path in entries {
        if fs.is_dir(&path) {
            walk(fs, spec, &path, cancel, out)?;
            continue;
        }
        if !fs.is_file(&path) {
            continue;
        }

        cancel.check()?;

        let Some(rel) = relative_str(spec.root, &path) else {
            warn!(path = ?path, root = ?spec.root, "file outside resource root; skipping");
            continue;
        };
        if !spec.matcher.matches(&rel) {
            trace!(rel = %rel, "not selected by patterns");
            continue;
        }

        let timestamp = fs.modified(&path).unwrap_or_else(|e| {
            warn!(path = ?path, error = %e, "cannot read modification time");
            ValidityState::UNKNOWN_TIMESTAMP
        });

        out.push(CandidateItem {
            unit: spec.unit.to_string(),
            output: output_path_for(spec.destination, &rel),
            source: path,
            filtered: spec.filtering,
            properties: Arc::clone(spec.properties),
            validity: ValidityState::new(timestamp, spec.filtering, spec.properties_hash),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn collect(fs: &MockFileSystem, matcher: &PatternMatcher, cancel: &CancelFlag) -> Result<Vec<CandidateItem>> {
        let properties = Arc::new(PropertySet::new());
        let spec = RootSpec {
            unit: "core",
            root: Path::new("res"),
            destination: Path::new("out/core/"),
            matcher,
            filtering: false,
            properties: &properties,
            properties_hash: 7,
        };
        collect_candidates(fs, &spec, cancel)
    }

    #[test]
    fn walks_in_file_name_order_and_descends_excluded_dirs() {
        let fs = MockFileSystem::new();
        fs.add_file("res/zeta.txt", "z");
        fs.add_file("res/sub/b.txt", "b");
        fs.add_file("res/alpha.txt", "a");
        fs.add_file("res/sub/deeper/c.xml", "c");

        let matcher = PatternMatcher::new(&[], &["sub/*.txt".to_string()]).unwrap();
        let items = collect(&fs, &matcher, &CancelFlag::new()).unwrap();

        let outputs: Vec<&str> = items.iter().map(|i| i.output_path()).collect();
        assert_eq!(
            outputs,
            vec!["out/core/alpha.txt", "out/core/sub/deeper/c.xml", "out/core/zeta.txt"]
        );
        assert_eq!(items[0].source_path(), Path::new("res/alpha.txt"));
        assert_eq!(items[0].validity_state().properties_hash, 7);
    }

    #[test]
    fn missing_root_yields_nothing() {
        let fs = MockFileSystem::new();
        let matcher = PatternMatcher::new(&[], &[]).unwrap();
        assert!(collect(&fs, &matcher, &CancelFlag::new()).unwrap().is_empty());
    }

    #[test]
    fn cancellation_aborts_the_walk() {
        let fs = MockFileSystem::new();
        fs.add_file("res/a.txt", "a");
        let matcher = PatternMatcher::new(&[], &[]).unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();

        let err = collect(&fs, &matcher, &cancel).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn listing_errors_are_returned() {
        let fs = MockFileSystem::new();
        fs.add_file("res/a.txt", "a");
        let matcher = PatternMatcher::new(&[], &[]).unwrap();
        let properties = Arc::new(PropertySet::new());
        let spec = RootSpec {
            unit: "core",
            root: Path::new("res"),
            destination: Path::new("out"),
            matcher: &matcher,
            filtering: false,
            properties: &properties,
            properties_hash: 0,
        };

        // Listing a plain file fails like an unreadable directory would.
        let mut out = Vec::new();
        let err = walk(&fs, &spec, Path::new("res/a.txt"), &CancelFlag::new(), &mut out).unwrap_err();
        assert!(!err.is_cancelled());
        assert!(out.is_empty());
    }

    #[test]
    fn output_path_joins_with_single_slash() {
        assert_eq!(output_path_for(Path::new("out/"), "a/b.txt"), "out/a/b.txt");
        assert_eq!(output_path_for(Path::new("out"), "b.txt"), "out/b.txt");
    }
}
