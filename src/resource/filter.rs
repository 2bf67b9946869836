// src/resource/filter.rs

//! Text substitution and charset handling for filtered resources.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::resource::properties::PropertySet;

/// Substitution applied to the text of filtered resources.
///
/// Implementations must be pure: the same `(unit, text, properties)` always
/// yields the same output.
pub trait TextFilter: Send + Sync {
    fn filter(&self, unit: &str, text: &str, properties: &PropertySet) -> String;
}

/// Replaces `${key}` and `@key@` with values from the property set.
///
/// References to unknown keys are left untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderFilter;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}\s]+)\}|@([A-Za-z0-9_.\-]+)@").expect("placeholder regex is valid")
});

impl TextFilter for PlaceholderFilter {
    fn filter(&self, _unit: &str, text: &str, properties: &PropertySet) -> String {
        PLACEHOLDER
            .replace_all(text, |caps: &Captures<'_>| {
                let key = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .map(|m| m.as_str())
                    .unwrap_or_default();
                match properties.get(key) {
                    Some(value) => value.to_string(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

/// Character sets supported for reading and writing filtered resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Utf8,
    Latin1,
    Ascii,
}

impl Charset {
    /// Decode bytes. Invalid UTF-8 sequences become U+FFFD.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Charset::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Charset::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            Charset::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { '\u{fffd}' })
                .collect(),
        }
    }

    /// Encode text. Characters the charset cannot represent become `?`.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Charset::Utf8 => text.as_bytes().to_vec(),
            Charset::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
            Charset::Ascii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::Latin1 => "ISO-8859-1",
            Charset::Ascii => "US-ASCII",
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Charset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(Charset::Utf8),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Ok(Charset::Latin1),
            "us-ascii" | "ascii" => Ok(Charset::Ascii),
            other => Err(format!("unsupported charset: {other}")),
        }
    }
}

/// Decides which charset name to use for a source file.
///
/// The same name is used to read the source and to write the output.
pub trait CharsetResolver: Send + Sync {
    fn charset_for(&self, source: &Path) -> String;
}

/// `*.properties` files get `properties_encoding`, everything else `encoding`.
#[derive(Debug, Clone)]
pub struct DefaultCharsetResolver {
    pub encoding: String,
    pub properties_encoding: String,
}

impl Default for DefaultCharsetResolver {
    fn default() -> Self {
        Self {
            encoding: Charset::Utf8.name().to_string(),
            properties_encoding: Charset::Latin1.name().to_string(),
        }
    }
}

impl CharsetResolver for DefaultCharsetResolver {
    fn charset_for(&self, source: &Path) -> String {
        let is_properties = source
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("properties"));
        if is_properties {
            self.properties_encoding.clone()
        } else {
            self.encoding.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> PropertySet {
        pairs.iter().copied().collect()
    }

    #[test]
    fn both_placeholder_styles_are_replaced() {
        let p = props(&[("name", "Widget"), ("app.version", "1.2")]);
        let out = PlaceholderFilter.filter("core", "${name} @app.version@ ${missing} @nope@", &p);
        assert_eq!(out, "Widget 1.2 ${missing} @nope@");
    }

    #[test]
    fn email_like_text_is_left_alone() {
        let out = PlaceholderFilter.filter("core", "mail me@example.com", &props(&[]));
        assert_eq!(out, "mail me@example.com");
    }

    #[test]
    fn latin1_round_trips_every_byte() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        let text = Charset::Latin1.decode(&bytes);
        assert_eq!(Charset::Latin1.encode(&text), bytes);
    }

    #[test]
    fn unencodable_chars_become_question_marks() {
        assert_eq!(Charset::Ascii.encode("naïve"), b"na?ve");
        assert_eq!(Charset::Latin1.encode("€"), b"?");
    }

    #[test]
    fn charset_names_parse_loosely() {
        assert_eq!("utf8".parse::<Charset>(), Ok(Charset::Utf8));
        assert_eq!("ISO_8859_1".parse::<Charset>(), Ok(Charset::Latin1));
        assert_eq!(" US-ASCII ".parse::<Charset>(), Ok(Charset::Ascii));
        assert!("cp1252".parse::<Charset>().is_err());
    }

    #[test]
    fn properties_files_get_their_own_encoding() {
        let r = DefaultCharsetResolver::default();
        assert_eq!(r.charset_for(Path::new("a/b.PROPERTIES")), "ISO-8859-1");
        assert_eq!(r.charset_for(Path::new("a/b.xml")), "UTF-8");
    }
}
