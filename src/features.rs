use bitflags::bitflags;

bitflags! {
    /// Togglable encoder features, supplied at construction as a bit-set.
    ///
    /// The set is fixed for the lifetime of an encoder: the stringref table
    /// and the self-describe header only make sense when decided before the
    /// first byte is produced.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EncoderFeatures: u32 {
        /// Use the smallest integer representation that retains the value.
        /// When disabled, integers use the width of their source type
        /// (4 bytes for `i32`, 8 bytes for `i64`).
        const WRITE_MINIMAL_INTS = 1 << 0;

        /// Write the CBOR self-describe tag (55799, on the wire
        /// `D9 D9 F7`) at the beginning of the stream.
        const WRITE_TYPE_HEADER = 1 << 1;

        /// Replace invalid surrogate sequences in UTF-16 input with
        /// U+FFFD instead of failing.
        const LENIENT_UTF_ENCODING = 1 << 2;

        /// Emit stringref (tag 25) backreferences for repeated text and
        /// byte strings, per <http://cbor.schmorp.de/stringref>. Readers
        /// must support the extension to decode the output.
        const STRINGREF = 1 << 3;

        /// Narrow a double to a 4-byte float when no precision is lost.
        const WRITE_MINIMAL_DOUBLES = 1 << 4;

        /// On `close`, terminate any containers still open before flushing.
        const AUTO_CLOSE_CONTENT = 1 << 5;

        /// On `close`, close the sink as well.
        const CLOSE_SINK = 1 << 6;

        /// Forward `flush` to the sink; also applies to the implicit flush
        /// performed by `close` when the sink is not being closed.
        const FLUSH_PASSED_TO_SINK = 1 << 7;
    }
}

impl EncoderFeatures {
    /// The features enabled by default.
    #[must_use]
    pub const fn default_set() -> Self {
        Self::WRITE_MINIMAL_INTS
            .union(Self::AUTO_CLOSE_CONTENT)
            .union(Self::FLUSH_PASSED_TO_SINK)
    }
}

impl Default for EncoderFeatures {
    fn default() -> Self {
        Self::default_set()
    }
}

