// src/cache/path_set.rs

use std::collections::BTreeMap;

use crate::types::CaseSensitivity;

/// A set of output path strings that honors filesystem case sensitivity.
///
/// On a case-insensitive configuration `Foo.txt` and `foo.txt` are one
/// entry; the spelling inserted last is kept. Iteration is sorted by the
/// comparison key, so serialization and deletion order are stable.
#[derive(Debug, Clone)]
pub struct PathSet {
    sensitivity: CaseSensitivity,
    entries: BTreeMap<String, String>,
}

impl PathSet {
    /// `sensitivity` is resolved immediately; `Auto` never leaks into a set.
    pub fn new(sensitivity: CaseSensitivity) -> Self {
        Self {
            sensitivity: sensitivity.resolve(),
            entries: BTreeMap::new(),
        }
    }

    pub fn from_paths<I, S>(sensitivity: CaseSensitivity, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new(sensitivity);
        for p in paths {
            set.insert(p);
        }
        set
    }

    pub fn sensitivity(&self) -> CaseSensitivity {
        self.sensitivity
    }

    fn key(&self, path: &str) -> String {
        if self.sensitivity.is_sensitive() {
            path.to_string()
        } else {
            path.to_lowercase()
        }
    }

    /// Returns true if the path was not present yet.
    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        let key = self.key(&path);
        self.entries.insert(key, path).is_none()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(&self.key(path))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Paths as originally spelled.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str)
    }

    /// Paths in `self` that `other` does not contain, compared with `self`'s
    /// sensitivity.
    pub fn difference(&self, other: &PathSet) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(key, path)| {
                if other.sensitivity == self.sensitivity {
                    !other.entries.contains_key(*key)
                } else {
                    !other.contains(path)
                }
            })
            .map(|(_, path)| path.clone())
            .collect()
    }

    /// Re-key under a different sensitivity.
    pub fn with_sensitivity(&self, sensitivity: CaseSensitivity) -> PathSet {
        PathSet::from_paths(sensitivity, self.iter().map(str::to_string))
    }
}

impl PartialEq for PathSet {
    fn eq(&self, other: &Self) -> bool {
        self.sensitivity == other.sensitivity
            && self.entries.len() == other.entries.len()
            && self.entries.keys().all(|k| other.entries.contains_key(k))
    }
}

impl Eq for PathSet {}
