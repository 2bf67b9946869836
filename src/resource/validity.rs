// src/resource/validity.rs

//! Per-item staleness fingerprints and the seam to whatever decides, run to
//! run, whether an item must be reprocessed.

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::sync::Mutex;

use crate::resource::discovery::CandidateItem;

/// Fingerprint of everything that affects an item's output.
///
/// Two states are equal iff all three fields are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValidityState {
    /// Source modification time, milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub filtered: bool,
    /// [`PropertySet::fingerprint`](crate::resource::properties::PropertySet::fingerprint)
    /// of the unit's active properties.
    pub properties_hash: u64,
}

impl ValidityState {
    /// Size of the serialized form in bytes.
    pub const ENCODED_LEN: usize = 8 + 1 + 8;

    /// Stands in for a modification time that could not be read. A state
    /// carrying it is never up to date.
    pub const UNKNOWN_TIMESTAMP: i64 = i64::MIN;

    pub fn new(timestamp: i64, filtered: bool, properties_hash: u64) -> Self {
        Self {
            timestamp,
            filtered,
            properties_hash,
        }
    }

    pub fn is_known(&self) -> bool {
        self.timestamp != Self::UNKNOWN_TIMESTAMP
    }

    /// Big-endian `timestamp:i64`, `filtered:u8`, `properties_hash:u64`.
    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        out.write_all(&self.timestamp.to_be_bytes())?;
        out.write_all(&[u8::from(self.filtered)])?;
        out.write_all(&self.properties_hash.to_be_bytes())?;
        Ok(())
    }

    pub fn read_from(input: &mut impl Read) -> io::Result<Self> {
        let mut ts = [0u8; 8];
        input.read_exact(&mut ts)?;
        let mut flag = [0u8; 1];
        input.read_exact(&mut flag)?;
        let mut hash = [0u8; 8];
        input.read_exact(&mut hash)?;

        let filtered = match flag[0] {
            0 => false,
            1 => true,
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("invalid filtered flag {other}"),
                ));
            }
        };

        Ok(Self {
            timestamp: i64::from_be_bytes(ts),
            filtered,
            properties_hash: u64::from_be_bytes(hash),
        })
    }
}

/// Decides whether a candidate needs processing, and remembers what was
/// processed.
///
/// This stands in for the host's generic incremental-item bookkeeping.
pub trait ValidityTracker: Send + Sync {
    /// True if the output recorded for this item is still current.
    fn is_up_to_date(&self, item: &CandidateItem) -> bool;

    /// Record that `item` was processed successfully.
    fn record(&self, item: &CandidateItem);

    /// Forget an output that was deleted.
    fn forget(&self, output_path: &str);
}

/// Never skips anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReprocess;

impl ValidityTracker for AlwaysReprocess {
    fn is_up_to_date(&self, _item: &CandidateItem) -> bool {
        false
    }

    fn record(&self, _item: &CandidateItem) {}

    fn forget(&self, _output_path: &str) {}
}

/// Remembers validity per output path for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryValidity {
    states: Mutex<HashMap<String, ValidityState>>,
}

impl InMemoryValidity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, ValidityState>> {
        self.states.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ValidityTracker for InMemoryValidity {
    fn is_up_to_date(&self, item: &CandidateItem) -> bool {
        let state = item.validity_state();
        state.is_known() && self.lock().get(item.output_path()) == Some(&state)
    }

    fn record(&self, item: &CandidateItem) {
        self.lock()
            .insert(item.output_path().to_string(), item.validity_state());
    }

    fn forget(&self, output_path: &str) {
        self.lock().remove(output_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_form_is_fixed_size_and_readable() {
        let state = ValidityState::new(1_700_000_000_123, true, 0xdead_beef_0102_0304);
        let mut buf = Vec::new();
        state.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), ValidityState::ENCODED_LEN);
        assert_eq!(buf[8], 1);

        let back = ValidityState::read_from(&mut buf.as_slice()).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn bad_flag_byte_is_rejected() {
        let mut buf = Vec::new();
        ValidityState::new(0, false, 0).write_to(&mut buf).unwrap();
        buf[8] = 7;
        let err = ValidityState::read_from(&mut buf.as_slice()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn states_differ_when_any_field_differs() {
        let base = ValidityState::new(10, false, 1);
        assert_ne!(base, ValidityState::new(11, false, 1));
        assert_ne!(base, ValidityState::new(10, true, 1));
        assert_ne!(base, ValidityState::new(10, false, 2));
        assert_eq!(base, ValidityState::new(10, false, 1));
    }

    #[test]
    fn unknown_timestamp_is_not_known() {
        assert!(!ValidityState::new(ValidityState::UNKNOWN_TIMESTAMP, false, 0).is_known());
        assert!(ValidityState::new(0, false, 0).is_known());
    }
}
