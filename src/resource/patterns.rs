// src/resource/patterns.rs

use std::fmt;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::errors::{ResflowError, Result};

/// Include pattern used when a resource root declares none.
pub const DEFAULT_INCLUDE: &str = "**/*";

/// Compiled include/exclude patterns for a single resource root.
///
/// Patterns follow the usual directory-glob rules and are matched against
/// forward-slash paths relative to the root (e.g. `"conf/app.properties"`):
///
/// - `*` and `?` never cross a `/`.
/// - `**` spans any number of directories, including none, so `**/*.xml`
///   also matches a top-level `a.xml`.
/// - A trailing `/` means "everything below", i.e. `conf/` is `conf/**`.
#[derive(Clone)]
pub struct PatternMatcher {
    include_set: GlobSet,
    /// `None` when no excludes were declared: nothing is excluded.
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for PatternMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternMatcher")
            .field("includes", &self.include_set.len())
            .field("excludes", &self.exclude_set.as_ref().map(GlobSet::len))
            .finish()
    }
}

impl PatternMatcher {
    /// Compile the given lists. An empty include list means [`DEFAULT_INCLUDE`].
    pub fn new(includes: &[String], excludes: &[String]) -> Result<Self> {
        let include_set = if includes.is_empty() {
            build_globset([DEFAULT_INCLUDE])?
        } else {
            build_globset(includes.iter().map(String::as_str))?
        };

        let exclude_set = if excludes.is_empty() {
            None
        } else {
            Some(build_globset(excludes.iter().map(String::as_str))?)
        };

        Ok(Self {
            include_set,
            exclude_set,
        })
    }

    /// Returns true if `rel_path` matches an include and no exclude.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Normalize a user-written pattern into globset syntax.
fn normalize_pattern(pattern: &str) -> String {
    let mut pat = pattern.trim().replace('\\', "/");
    while let Some(stripped) = pat.strip_prefix("./") {
        pat = stripped.to_string();
    }
    if let Some(stripped) = pat.strip_prefix('/') {
        pat = stripped.to_string();
    }
    if pat.is_empty() || pat.ends_with('/') {
        pat.push_str("**");
    }
    pat
}

fn build_globset<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(&normalize_pattern(pat))
            .literal_separator(true)
            .build()
            .map_err(|source| ResflowError::InvalidPattern {
                pattern: pat.to_string(),
                source,
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| ResflowError::Other(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn default_include_matches_everything() {
        let m = PatternMatcher::new(&[], &[]).unwrap();
        assert!(m.matches("a.txt"));
        assert!(m.matches("deep/nested/dir/b.properties"));
    }

    #[test]
    fn single_star_stays_in_one_segment() {
        let m = PatternMatcher::new(&strings(&["*.xml"]), &[]).unwrap();
        assert!(m.matches("beans.xml"));
        assert!(!m.matches("META-INF/beans.xml"));
    }

    #[test]
    fn excludes_win_over_includes() {
        let m = PatternMatcher::new(&strings(&["**/*.properties"]), &strings(&["**/secret*"]))
            .unwrap();
        assert!(m.matches("app.properties"));
        assert!(m.matches("conf/app.properties"));
        assert!(!m.matches("conf/secret.properties"));
        assert!(!m.matches("readme.txt"));
    }

    #[test]
    fn trailing_slash_means_whole_subtree() {
        let m = PatternMatcher::new(&strings(&["conf/"]), &[]).unwrap();
        assert!(m.matches("conf/a/b.txt"));
        assert!(!m.matches("other/b.txt"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = PatternMatcher::new(&strings(&["a[b"]), &[]).unwrap_err();
        assert!(matches!(err, ResflowError::InvalidPattern { ref pattern, .. } if pattern == "a[b"));
    }
}
