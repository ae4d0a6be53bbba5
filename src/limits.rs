//! Output-side resource limits and buffer sizing.

/// Default size of the output buffer, large enough to leave comfortable
/// safety margins for worst-case UTF-8 expansion.
pub const DEFAULT_BUFFER_LENGTH: usize = 16_000;

/// Smallest supported output buffer: a contiguous 256-character string
/// encoded in 3-byte sequences, plus head and break bytes.
pub const MIN_BUFFER_LENGTH: usize = (3 * 256) + 2;

/// Default maximum nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Write-time limits, enforced deterministically on every container start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteLimits {
    /// Maximum nesting depth of open arrays and maps.
    pub max_nesting_depth: usize,
}

impl WriteLimits {
    /// Construct limits with an explicit maximum nesting depth.
    #[must_use]
    pub const fn with_max_depth(max_nesting_depth: usize) -> Self {
        Self { max_nesting_depth }
    }
}

impl Default for WriteLimits {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Ceiling on chunk size in code units: a full chunk of three-byte units
/// must still fit the two-byte length head (21845 * 3 = 65535).
const MAX_CHUNK_CHARS: usize = 0xffff / 3;

/// Longest character chunk written as a single definite-length text item,
/// chosen so one chunk fits an empty buffer even if every unit encodes to
/// three bytes, and clamped so its encoded length always fits a `uint16`
/// head.
#[inline]
#[must_use]
pub(crate) const fn max_long_string_chars(buffer_len: usize) -> usize {
    let chars = (buffer_len / 4) - 4;
    if chars > MAX_CHUNK_CHARS {
        MAX_CHUNK_CHARS
    } else {
        chars
    }
}

/// Worst-case byte length of a maximum chunk, including its head.
#[inline]
#[must_use]
pub(crate) const fn max_long_string_bytes(buffer_len: usize) -> usize {
    max_long_string_chars(buffer_len) * 3 + 3
}

