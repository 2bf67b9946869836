// src/resource/properties.rs

//! Property sets used for filtering, and the `.properties` reader that feeds
//! them from filter files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use blake3::Hasher;
use tracing::{debug, warn};

use crate::fs::FileSystem;
use crate::resource::filter::Charset;

/// Key/value pairs active for one unit's filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySet {
    values: BTreeMap<String, String>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlay `other` on top of `self`; keys in `other` win.
    pub fn extend(&mut self, other: PropertySet) {
        self.values.extend(other.values);
    }

    /// Order-independent digest of the set.
    ///
    /// Each pair is rendered as `key->value`, the lines are sorted and hashed
    /// in that order, so two sets with the same pairs always agree no matter
    /// how they were built.
    pub fn fingerprint(&self) -> u64 {
        let mut lines: Vec<String> = self
            .values
            .iter()
            .map(|(k, v)| format!("{k}->{v}"))
            .collect();
        lines.sort();

        let mut hasher = Hasher::new();
        for line in &lines {
            hasher.update(&(line.len() as u64).to_le_bytes());
            hasher.update(line.as_bytes());
        }
        let digest = hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest.as_bytes()[..8]);
        u64::from_le_bytes(head)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertySet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = PropertySet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

/// A filter file that could not be read.
#[derive(Debug, Clone)]
pub struct FilterReadFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Read every filter file in order and merge them into one set.
///
/// Unreadable files contribute nothing; they are returned so the caller can
/// report them as warnings against the owning unit.
pub fn load_filters(fs: &dyn FileSystem, paths: &[PathBuf]) -> (PropertySet, Vec<FilterReadFailure>) {
    let mut merged = PropertySet::new();
    let mut failures = Vec::new();

    for path in paths {
        match fs.read(path) {
            Ok(bytes) => {
                let parsed = parse_properties(&Charset::Latin1.decode(&bytes));
                debug!(path = ?path, count = parsed.len(), "loaded filter file");
                merged.extend(parsed);
            }
            Err(e) => {
                warn!(path = ?path, error = %e, "cannot read filter file");
                failures.push(FilterReadFailure {
                    path: path.clone(),
                    reason: format!("{e:#}"),
                });
            }
        }
    }

    (merged, failures)
}

/// Parse the text of a Java-style `.properties` file.
///
/// Supports `#`/`!` comments, `=`/`:`/whitespace separators, backslash line
/// continuations and the usual escapes including `\uXXXX`.
pub fn parse_properties(text: &str) -> PropertySet {
    let mut set = PropertySet::new();

    for logical in logical_lines(text) {
        let (key, value) = split_key_value(&logical);
        set.insert(unescape(key), unescape(value));
    }

    set
}

/// Join continuation lines and drop comments/blank lines.
fn logical_lines(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Option<String> = None;

    for raw in text.lines() {
        let line = match current {
            // Leading whitespace of a continuation line is not part of the value.
            Some(_) => raw.trim_start(),
            None => {
                let trimmed = raw.trim_start();
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                trimmed
            }
        };

        let continued = ends_with_odd_backslashes(line);
        let body = if continued { &line[..line.len() - 1] } else { line };
        current.get_or_insert_with(String::new).push_str(body);

        if !continued {
            if let Some(done) = current.take() {
                out.push(done);
            }
        }
    }

    if let Some(rest) = current {
        out.push(rest);
    }
    out
}

fn ends_with_odd_backslashes(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (idx, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (&line[..idx], line[idx + 1..].trim_start()),
            c if c.is_whitespace() => {
                let rest = line[idx..].trim_start();
                let rest = rest
                    .strip_prefix('=')
                    .or_else(|| rest.strip_prefix(':'))
                    .unwrap_or(rest);
                return (&line[..idx], rest.trim_start());
            }
            _ => {}
        }
    }
    (line, "")
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}
