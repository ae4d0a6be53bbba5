use core::fmt;
use std::io;

/// A structured error code identifying why an encoder operation failed.
///
/// Codes are stable and carry only small copyable payloads (offending code
/// units, leftover element counts) so they stay comparable in tests and
/// cheap on the hot path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCode {
    /// A value was written while the current map frame expects a field name.
    ExpectingFieldName,
    /// A field name was written while a value was expected, or outside a map.
    ExpectingValue,
    /// `write_end_array` called while the current frame is not an array.
    NotInArray,
    /// `write_end_object` called while the current frame is not a map.
    NotInObject,
    /// A write was attempted on a closed or poisoned encoder.
    WriteAfterClose,

    /// More elements written than a definite-length container declared.
    ContainerOverrun,
    /// A definite-length container was closed with elements still expected.
    /// Carries the number of missing elements (field names and values each
    /// count as one).
    ContainerUnderflow(u64),

    /// A high surrogate was the last code unit of the input.
    UnmatchedHighSurrogate(u16),
    /// A low surrogate appeared without a preceding high surrogate.
    InvalidSurrogateStart(u16),
    /// A high surrogate was followed by a unit outside the low range.
    InvalidSurrogatePair(u16, u16),

    /// The configured output buffer is below the supported minimum.
    OutputBufferTooSmall,
    /// Arithmetic overflow while computing a length (map size 2N).
    LengthOverflow,

    /// Nesting depth limit exceeded.
    DepthLimitExceeded,

    /// A streaming binary source ran out before the declared length.
    /// Carries the number of missing bytes.
    SourceUnderflow(u64),
    /// The byte sink failed; the cause is on [`std::error::Error::source`].
    Io,
}

/// Broad classification of an [`ErrorCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Token-sequence misuse: name/value alternation, frame kinds, lifecycle.
    Context,
    /// Definite-length container element accounting violated.
    SizeMismatch,
    /// Invalid UTF-16 input under strict transcoding.
    Encoding,
    /// Invalid configuration or argument.
    Argument,
    /// A configured limit was exceeded.
    Constraint,
    /// The sink or binary source failed.
    Io,
}

impl ErrorCode {
    /// Classify this code into the coarse [`ErrorKind`] categories.
    #[inline]
    #[must_use]
    pub const fn kind(self) -> ErrorKind {
        match self {
            Self::ExpectingFieldName
            | Self::ExpectingValue
            | Self::NotInArray
            | Self::NotInObject
            | Self::WriteAfterClose => ErrorKind::Context,
            Self::ContainerOverrun | Self::ContainerUnderflow(_) => ErrorKind::SizeMismatch,
            Self::UnmatchedHighSurrogate(_)
            | Self::InvalidSurrogateStart(_)
            | Self::InvalidSurrogatePair(_, _) => ErrorKind::Encoding,
            Self::OutputBufferTooSmall | Self::LengthOverflow => ErrorKind::Argument,
            Self::DepthLimitExceeded => ErrorKind::Constraint,
            Self::SourceUnderflow(_) | Self::Io => ErrorKind::Io,
        }
    }
}

/// An encoder error with a structured code and the byte offset at which it
/// was detected.
///
/// The offset counts every byte the encoder has produced, flushed or still
/// buffered. Sink failures keep the underlying [`io::Error`] reachable
/// through [`std::error::Error::source`].
#[derive(Debug)]
pub struct EncodeError {
    code: ErrorCode,
    offset: u64,
    source: Option<io::Error>,
}

impl EncodeError {
    /// Construct an error at `offset`.
    #[inline]
    #[must_use]
    pub const fn new(code: ErrorCode, offset: u64) -> Self {
        Self {
            code,
            offset,
            source: None,
        }
    }

    /// Wrap a sink failure.
    #[inline]
    #[must_use]
    pub fn io(cause: io::Error, offset: u64) -> Self {
        Self {
            code: ErrorCode::Io,
            offset,
            source: Some(cause),
        }
    }

    /// The structured error code.
    #[inline]
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Coarse classification of the code.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    /// Byte offset (produced bytes, flushed plus buffered) at detection.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cbor encode error at {}: ", self.offset)?;
        match self.code {
            ErrorCode::ExpectingFieldName => {
                f.write_str("can not write a value, expecting a field name")
            }
            ErrorCode::ExpectingValue => {
                f.write_str("can not write a field name, expecting a value")
            }
            ErrorCode::NotInArray => f.write_str("current context not an array"),
            ErrorCode::NotInObject => f.write_str("current context not an object"),
            ErrorCode::WriteAfterClose => f.write_str("encoder already closed"),
            ErrorCode::ContainerOverrun => f.write_str(
                "size mismatch: number of elements encoded exceeds reported array/map size",
            ),
            ErrorCode::ContainerUnderflow(n) => {
                write!(f, "size mismatch: expected {n} more elements")
            }
            ErrorCode::UnmatchedHighSurrogate(c) => write!(
                f,
                "unmatched surrogate pair, starts with valid high surrogate \
                 (0x{c:04X}) but ends without low surrogate"
            ),
            ErrorCode::InvalidSurrogateStart(c) => write!(
                f,
                "invalid surrogate pair, starts with invalid high surrogate \
                 (0x{c:04X}), not in valid range [0xD800, 0xDBFF]"
            ),
            ErrorCode::InvalidSurrogatePair(hi, lo) => write!(
                f,
                "invalid surrogate pair, starts with valid high surrogate (0x{hi:04X}) \
                 but ends with invalid low surrogate (0x{lo:04X}), \
                 not in valid range [0xDC00, 0xDFFF]"
            ),
            ErrorCode::OutputBufferTooSmall => write!(
                f,
                "output buffer too short, must be at least {} bytes",
                crate::limits::MIN_BUFFER_LENGTH
            ),
            ErrorCode::LengthOverflow => f.write_str("length overflow"),
            ErrorCode::DepthLimitExceeded => f.write_str("nesting depth limit exceeded"),
            ErrorCode::SourceUnderflow(n) => {
                write!(f, "too few bytes available: missing {n} bytes")
            }
            ErrorCode::Io => f.write_str("sink write failed"),
        }
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
