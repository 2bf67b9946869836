use serde::Deserialize;

/// How output paths are compared when computing deletion sets.
///
/// - `Auto`: follow the platform convention (Windows and macOS volumes are
///   case-insensitive by default, everything else is case-sensitive).
/// - `Sensitive`: `Foo.txt` and `foo.txt` are different outputs.
/// - `Insensitive`: `Foo.txt` and `foo.txt` are the same output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseSensitivity {
    Auto,
    Sensitive,
    Insensitive,
}

impl Default for CaseSensitivity {
    fn default() -> Self {
        CaseSensitivity::Auto
    }
}

impl CaseSensitivity {
    /// Resolve `Auto` against the current platform.
    pub fn resolve(self) -> CaseSensitivity {
        match self {
            CaseSensitivity::Auto => {
                if cfg!(any(windows, target_os = "macos")) {
                    CaseSensitivity::Insensitive
                } else {
                    CaseSensitivity::Sensitive
                }
            }
            other => other,
        }
    }

    pub fn is_sensitive(self) -> bool {
        self.resolve() == CaseSensitivity::Sensitive
    }
}

/// Which declared resource list a descriptor came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceScope {
    /// `resources`, written to the unit's `output` directory.
    Main,
    /// `test_resources`, written to the unit's `test_output` directory.
    Test,
}

impl std::fmt::Display for ResourceScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceScope::Main => f.write_str("main"),
            ResourceScope::Test => f.write_str("test"),
        }
    }
}
