// src/cache/codec.rs

//! Binary layout of the output cache file.
//!
//! ```text
//! format_version : i32
//! unit_count     : i32
//! unit_count x {
//!     unit_name  : string
//!     path_count : i32
//!     path_count x path : string
//! }
//! checksum       : [u8; 32]   BLAKE3 of every byte above
//! ```
//!
//! Integers are big-endian. A string is an `i32` byte length followed by
//! UTF-8 bytes. Any deviation rejects the whole file.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::cache::path_set::PathSet;
use crate::types::CaseSensitivity;

/// Current format version. Bump on any layout change.
pub const FORMAT_VERSION: i32 = 1;

const CHECKSUM_LEN: usize = 32;

/// Why a cache file was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheDecodeError {
    #[error("format version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: i32, actual: i32 },

    #[error("cache file truncated at byte {offset}")]
    Truncated { offset: usize },

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("negative length {value} at byte {offset}")]
    NegativeLength { value: i32, offset: usize },

    #[error("invalid UTF-8 string at byte {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("{count} unexpected bytes after the last unit")]
    TrailingBytes { count: usize },
}

/// Serialize all entries, units in key order.
pub fn encode(entries: &BTreeMap<String, PathSet>) -> Vec<u8> {
    let mut out = Vec::new();
    put_i32(&mut out, FORMAT_VERSION);
    put_i32(&mut out, entries.len() as i32);
    for (unit, paths) in entries {
        put_str(&mut out, unit);
        put_i32(&mut out, paths.len() as i32);
        for path in paths.iter() {
            put_str(&mut out, path);
        }
    }
    let checksum = blake3::hash(&out);
    out.extend_from_slice(checksum.as_bytes());
    out
}

/// Parse a cache file produced by [`encode`].
///
/// Path sets are rebuilt with `sensitivity`.
pub fn decode(
    bytes: &[u8],
    sensitivity: CaseSensitivity,
) -> Result<BTreeMap<String, PathSet>, CacheDecodeError> {
    let mut reader = Reader { bytes, pos: 0 };

    // Check the version first so old files report the real reason.
    let version = reader.i32()?;
    if version != FORMAT_VERSION {
        return Err(CacheDecodeError::VersionMismatch {
            expected: FORMAT_VERSION,
            actual: version,
        });
    }

    if bytes.len() < 4 + CHECKSUM_LEN {
        return Err(CacheDecodeError::Truncated { offset: bytes.len() });
    }
    let body_end = bytes.len() - CHECKSUM_LEN;
    if blake3::hash(&bytes[..body_end]).as_bytes() != &bytes[body_end..] {
        return Err(CacheDecodeError::ChecksumMismatch);
    }
    reader.bytes = &bytes[..body_end];

    let unit_count = reader.len()?;
    let mut entries = BTreeMap::new();
    for _ in 0..unit_count {
        let unit = reader.string()?;
        let path_count = reader.len()?;
        let mut paths = PathSet::new(sensitivity);
        for _ in 0..path_count {
            paths.insert(reader.string()?);
        }
        entries.insert(unit, paths);
    }

    if reader.pos != reader.bytes.len() {
        return Err(CacheDecodeError::TrailingBytes {
            count: reader.bytes.len() - reader.pos,
        });
    }

    Ok(entries)
}

fn put_i32(out: &mut Vec<u8>, value: i32) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_str(out: &mut Vec<u8>, value: &str) {
    put_i32(out, value.len() as i32);
    out.extend_from_slice(value.as_bytes());
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], CacheDecodeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(CacheDecodeError::Truncated { offset: self.pos })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn i32(&mut self) -> Result<i32, CacheDecodeError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(i32::from_be_bytes(buf))
    }

    fn len(&mut self) -> Result<usize, CacheDecodeError> {
        let offset = self.pos;
        let value = self.i32()?;
        usize::try_from(value).map_err(|_| CacheDecodeError::NegativeLength { value, offset })
    }

    fn string(&mut self) -> Result<String, CacheDecodeError> {
        let len = self.len()?;
        let offset = self.pos;
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| CacheDecodeError::InvalidUtf8 { offset })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BTreeMap<String, PathSet> {
        let mut entries = BTreeMap::new();
        entries.insert(
            "core".to_string(),
            PathSet::from_paths(CaseSensitivity::Sensitive, ["out/core/a.properties", "out/core/b.txt"]),
        );
        entries.insert("empty".to_string(), PathSet::new(CaseSensitivity::Sensitive));
        entries
    }

    #[test]
    fn decodes_what_it_encodes() {
        let bytes = encode(&sample());
        let decoded = decode(&bytes, CaseSensitivity::Sensitive).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn rejects_other_versions() {
        let mut bytes = encode(&sample());
        bytes[..4].copy_from_slice(&(FORMAT_VERSION + 1).to_be_bytes());
        assert_eq!(
            decode(&bytes, CaseSensitivity::Sensitive),
            Err(CacheDecodeError::VersionMismatch {
                expected: FORMAT_VERSION,
                actual: FORMAT_VERSION + 1
            })
        );
    }

    #[test]
    fn rejects_torn_writes() {
        let bytes = encode(&sample());
        let torn = &bytes[..bytes.len() - 7];
        assert!(decode(torn, CaseSensitivity::Sensitive).is_err());
    }

    #[test]
    fn rejects_flipped_bits() {
        let mut bytes = encode(&sample());
        bytes[12] ^= 0x40;
        assert_eq!(
            decode(&bytes, CaseSensitivity::Sensitive),
            Err(CacheDecodeError::ChecksumMismatch)
        );
    }

    #[test]
    fn empty_input_is_truncated() {
        assert_eq!(
            decode(&[], CaseSensitivity::Sensitive),
            Err(CacheDecodeError::Truncated { offset: 0 })
        );
    }
}
