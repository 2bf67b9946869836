// src/watch/scope.rs

//! Decides which filesystem changes should trigger another pass.

use std::path::{Path, PathBuf};

use crate::project::Project;
use crate::types::ResourceScope;

/// Paths a watch session reacts to.
///
/// A change is relevant when it lies below a declared resource root or is
/// one of the filter files, and is not inside an output directory or the
/// cache directory (our own writes would otherwise re-trigger forever).
#[derive(Debug, Clone, Default)]
pub struct WatchScope {
    inputs: Vec<PathBuf>,
    filters: Vec<PathBuf>,
    ignored: Vec<PathBuf>,
}

impl WatchScope {
    pub fn for_project(project: &Project, cache_file: &Path) -> Self {
        let mut scope = Self::default();

        for unit in &project.units {
            for kind in [ResourceScope::Main, ResourceScope::Test] {
                scope
                    .inputs
                    .extend(unit.resources_for(kind).iter().map(|r| stable(&r.directory)));
                if let Some(out) = unit.output_for(kind) {
                    scope.ignored.push(stable(out));
                }
            }
            scope.filters.extend(unit.filters.iter().map(|f| stable(f)));
        }

        if let Some(dir) = cache_file.parent() {
            scope.ignored.push(stable(dir));
        }

        scope
    }

    pub fn is_relevant(&self, path: &Path) -> bool {
        let path = stable(path);
        if self.ignored.iter().any(|dir| path.starts_with(dir)) {
            return false;
        }
        self.filters.iter().any(|f| *f == path)
            || self.inputs.iter().any(|dir| path.starts_with(dir))
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.filters.is_empty()
    }

    /// Directories to register with the watcher.
    ///
    /// `root` is watched recursively. Resource roots outside it get their own
    /// recursive watch; filter files outside it are covered by a
    /// non-recursive watch on their parent directory.
    pub fn watch_targets(&self, root: &Path) -> Vec<WatchTarget> {
        let mut targets = vec![WatchTarget {
            path: stable(root),
            recursive: true,
        }];

        let mut inputs: Vec<&PathBuf> = self.inputs.iter().collect();
        inputs.sort_by_key(|p| p.components().count());
        for dir in inputs {
            if !targets.iter().any(|t| t.covers(dir)) {
                targets.push(WatchTarget {
                    path: dir.clone(),
                    recursive: true,
                });
            }
        }

        for filter in &self.filters {
            let Some(parent) = filter.parent() else {
                continue;
            };
            if !targets.iter().any(|t| t.covers(filter)) {
                targets.push(WatchTarget {
                    path: parent.to_path_buf(),
                    recursive: false,
                });
            }
        }

        targets
    }
}

/// One directory registration for the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub path: PathBuf,
    pub recursive: bool,
}

impl WatchTarget {
    fn covers(&self, path: &Path) -> bool {
        if self.recursive {
            path.starts_with(&self.path)
        } else {
            path.parent() == Some(self.path.as_path())
        }
    }
}

/// Canonicalize where possible.
///
/// Removed files cannot be canonicalized, so fall back to canonicalizing the
/// parent (handles macOS `/private/var` style prefixes) and finally to the
/// path as given.
fn stable(path: &Path) -> PathBuf {
    if let Ok(p) = path.canonicalize() {
        return p;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => match parent.canonicalize() {
            Ok(p) => p.join(name),
            Err(_) => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{BuildUnit, ResourceRoot};

    fn scope() -> WatchScope {
        let mut unit = BuildUnit::new("core");
        unit.output_dir = Some(PathBuf::from("/p/out"));
        unit.resources.push(ResourceRoot::new("/p/res"));
        unit.filters.push(PathBuf::from("/p/dev.properties"));
        let project = Project::new("/p").with_unit(unit);
        WatchScope::for_project(&project, Path::new("/p/.resflow/outputs.bin"))
    }

    #[test]
    fn resource_changes_are_relevant() {
        let s = scope();
        assert!(s.is_relevant(Path::new("/p/res/a/b.txt")));
        assert!(s.is_relevant(Path::new("/p/dev.properties")));
        assert!(!s.is_relevant(Path::new("/p/other.properties")));
    }

    #[test]
    fn inputs_outside_the_root_get_their_own_watch() {
        let mut unit = BuildUnit::new("core");
        unit.output_dir = Some(PathBuf::from("/p/out"));
        unit.resources.push(ResourceRoot::new("/p/res"));
        unit.resources.push(ResourceRoot::new("/shared/res"));
        unit.resources.push(ResourceRoot::new("/shared/res/nested"));
        unit.filters.push(PathBuf::from("/p/dev.properties"));
        unit.filters.push(PathBuf::from("/shared/filters/ci.properties"));
        unit.filters.push(PathBuf::from("/shared/filters/prod.properties"));
        let project = Project::new("/p").with_unit(unit);
        let s = WatchScope::for_project(&project, Path::new("/p/.resflow/outputs.bin"));

        let targets = s.watch_targets(Path::new("/p"));
        assert_eq!(
            targets,
            vec![
                WatchTarget { path: PathBuf::from("/p"), recursive: true },
                WatchTarget { path: PathBuf::from("/shared/res"), recursive: true },
                WatchTarget { path: PathBuf::from("/shared/filters"), recursive: false },
            ]
        );
        assert!(s.is_relevant(Path::new("/shared/res/x.txt")));
        assert!(s.is_relevant(Path::new("/shared/filters/ci.properties")));
        assert!(!s.is_relevant(Path::new("/shared/filters/other.properties")));
    }

    #[test]
    fn outputs_and_cache_are_ignored() {
        let s = scope();
        assert!(!s.is_relevant(Path::new("/p/out/b.txt")));
        assert!(!s.is_relevant(Path::new("/p/.resflow/outputs.bin")));
    }
}
