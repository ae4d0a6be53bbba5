use std::collections::HashMap;

/// Table of previously emitted text and byte strings, for the stringref
/// extension (<http://cbor.schmorp.de/stringref>).
///
/// Indices follow insertion order, shared across both namespaces: the next
/// index is always the current total entry count. Text keys compare by
/// code-point content, byte keys by exact content; inserting copies the
/// data, so later mutation by the caller cannot corrupt a lookup.
#[derive(Debug, Default)]
pub(crate) struct StringRefTable {
    text: HashMap<Box<str>, u64>,
    bytes: HashMap<Box<[u8]>, u64>,
}

impl StringRefTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.text.len() + self.bytes.len()
    }

    #[inline]
    pub fn get_text(&self, s: &str) -> Option<u64> {
        self.text.get(s).copied()
    }

    #[inline]
    pub fn get_bytes(&self, b: &[u8]) -> Option<u64> {
        self.bytes.get(b).copied()
    }

    /// Insert `s` with the next index iff it qualifies at the current table
    /// size. `encoded_len` is the string's encoded byte length.
    pub fn maybe_insert_text(&mut self, s: &str, encoded_len: usize) {
        if should_reference(self.len(), encoded_len) {
            let index = self.len() as u64;
            self.text.insert(Box::from(s), index);
        }
    }

    /// Insert an owned copy of `b` with the next index iff it qualifies.
    pub fn maybe_insert_bytes(&mut self, b: &[u8]) {
        if should_reference(self.len(), b.len()) {
            let index = self.len() as u64;
            self.bytes.insert(Box::from(b), index);
        }
    }
}

/// Whether a string of encoded byte length `len` earns a table entry when
/// the table already holds `count` strings.
///
/// The thresholds track the break-even point against the backreference's own
/// encoded size and must match decoders exactly: references 0..23 take two
/// bytes, 24..255 three, 256..65535 four, and larger five.
#[inline]
#[must_use]
pub(crate) fn should_reference(count: usize, len: usize) -> bool {
    (count < 24 && len >= 3)
        || (count < 256 && len >= 4)
        || (count < 65_536 && len >= 5)
        || ((count as u64) < 1 << 32 && len >= 7)
}
