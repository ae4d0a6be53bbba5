//! The streaming encoder: head emission, output buffering, value dispatch.

#![allow(clippy::cast_possible_truncation)]

use std::io;

use crate::buffers;
use crate::constants::{
    BYTE_ARRAY_2_ELEMENTS, BYTE_ARRAY_INDEFINITE, BYTE_BREAK, BYTE_EMPTY_TEXT, BYTE_FALSE,
    BYTE_FLOAT32, BYTE_FLOAT64, BYTE_MAP_INDEFINITE, BYTE_NULL, BYTE_TAG_BIGNUM_NEG,
    BYTE_TAG_BIGNUM_POS, BYTE_TAG_DECIMAL_FRACTION, BYTE_TEXT_INDEFINITE, BYTE_TRUE, PREFIX_ARRAY,
    PREFIX_BYTES, PREFIX_MAP, PREFIX_NINT, PREFIX_TAG, PREFIX_TEXT, PREFIX_UINT, SUFFIX_U16,
    SUFFIX_U32, SUFFIX_U64, SUFFIX_U8, SURR1_FIRST, SURR1_LAST, TAG_ID_STRINGREF,
};
use crate::context::{FrameKind, WriteContext};
use crate::error::{EncodeError, ErrorCode};
use crate::features::EncoderFeatures;
use crate::limits::{WriteLimits, DEFAULT_BUFFER_LENGTH, MIN_BUFFER_LENGTH};
use crate::refs::StringRefTable;
use crate::sink::ByteSink;
use crate::utf8;

const MAX_SHORT_STRING_CHARS: usize = 23;
const MAX_SHORT_STRING_BYTES: usize = 23 * 3 + 2;

const MAX_MEDIUM_STRING_CHARS: usize = 255;
const MAX_MEDIUM_STRING_BYTES: usize = 255 * 3 + 3;

/// Streaming CBOR encoder writing through a [`ByteSink`].
///
/// The encoder consumes structural and scalar token events
/// (`write_start_array`, `write_i64`, `write_text`, …) and emits RFC 8949
/// bytes, buffering internally and flushing whole items only. Token order
/// is verified as it goes: field names and values must alternate inside
/// maps, definite-length containers must receive exactly the declared
/// element count, and nesting depth is bounded by [`WriteLimits`].
///
/// Any error poisons the encoder; afterwards only [`close`](Self::close)
/// and the query methods remain usable.
#[derive(Debug)]
pub struct CborEncoder<S: ByteSink> {
    sink: S,
    features: EncoderFeatures,
    limits: WriteLimits,

    minimal_ints: bool,
    minimal_doubles: bool,
    lenient_utf: bool,

    buf: Vec<u8>,
    tail: usize,
    bytes_flushed: u64,

    /// Longest text run written as a single definite chunk, derived from
    /// the actual buffer length.
    max_long_chars: usize,
    max_long_bytes: usize,

    context: WriteContext,
    refs: Option<StringRefTable>,

    closed: bool,
    poisoned: bool,
}

impl<S: ByteSink> CborEncoder<S> {
    /// Construct an encoder with default features, limits and buffer size.
    #[must_use]
    pub fn new(sink: S) -> Self {
        Self::build(
            sink,
            EncoderFeatures::default_set(),
            WriteLimits::default(),
            DEFAULT_BUFFER_LENGTH,
        )
    }

    /// Construct an encoder with an explicit feature set.
    #[must_use]
    pub fn with_features(sink: S, features: EncoderFeatures) -> Self {
        Self::build(sink, features, WriteLimits::default(), DEFAULT_BUFFER_LENGTH)
    }

    /// Construct an encoder with explicit features, limits and buffer size.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::OutputBufferTooSmall`] if `buffer_len` is below
    /// [`MIN_BUFFER_LENGTH`].
    pub fn with_options(
        sink: S,
        features: EncoderFeatures,
        limits: WriteLimits,
        buffer_len: usize,
    ) -> Result<Self, EncodeError> {
        if buffer_len < MIN_BUFFER_LENGTH {
            return Err(EncodeError::new(ErrorCode::OutputBufferTooSmall, 0));
        }
        Ok(Self::build(sink, features, limits, buffer_len))
    }

    fn build(
        sink: S,
        features: EncoderFeatures,
        limits: WriteLimits,
        buffer_len: usize,
    ) -> Self {
        let mut enc = Self {
            sink,
            features,
            limits,
            minimal_ints: features.contains(EncoderFeatures::WRITE_MINIMAL_INTS),
            minimal_doubles: features.contains(EncoderFeatures::WRITE_MINIMAL_DOUBLES),
            lenient_utf: features.contains(EncoderFeatures::LENIENT_UTF_ENCODING),
            buf: buffers::acquire(buffer_len),
            tail: 0,
            bytes_flushed: 0,
            max_long_chars: crate::limits::max_long_string_chars(buffer_len),
            max_long_bytes: crate::limits::max_long_string_bytes(buffer_len),
            context: WriteContext::new(),
            refs: features
                .contains(EncoderFeatures::STRINGREF)
                .then(StringRefTable::new),
            closed: false,
            poisoned: false,
        };
        if features.contains(EncoderFeatures::WRITE_TYPE_HEADER) {
            // self-describe tag 55799, on the wire D9 D9 F7
            enc.buf[0] = 0xd9;
            enc.buf[1] = 0xd9;
            enc.buf[2] = 0xf7;
            enc.tail = 3;
        }
        enc
    }

    /*
     * Configuration and introspection
     */

    /// The feature set this encoder was built with.
    #[inline]
    #[must_use]
    pub const fn features(&self) -> EncoderFeatures {
        self.features
    }

    /// Whether every feature in `f` is enabled.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self, f: EncoderFeatures) -> bool {
        self.features.contains(f)
    }

    /// Bytes already flushed to the sink (excludes buffered bytes).
    #[inline]
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_flushed
    }

    /// Bytes produced but still held in the internal buffer.
    #[inline]
    #[must_use]
    pub const fn output_buffered(&self) -> usize {
        self.tail
    }

    /// Number of currently open arrays and maps.
    #[inline]
    #[must_use]
    pub fn nesting_depth(&self) -> usize {
        self.context.depth()
    }

    /// Whether `close` has completed.
    #[inline]
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /*
     * Structural output
     */

    /// Open an indefinite-length array.
    ///
    /// # Errors
    ///
    /// Fails on context misuse, depth limit, or a sink error.
    pub fn write_start_array(&mut self) -> Result<(), EncodeError> {
        self.verify_value_write()?;
        self.push_frame(FrameKind::Array, None)?;
        self.put_byte(BYTE_ARRAY_INDEFINITE)
    }

    /// Open a definite-length array of exactly `len` elements.
    ///
    /// # Errors
    ///
    /// Fails on context misuse, depth limit, or a sink error.
    pub fn write_start_array_sized(&mut self, len: u64) -> Result<(), EncodeError> {
        self.verify_value_write()?;
        self.push_frame(FrameKind::Array, Some(len))?;
        self.write_head(PREFIX_ARRAY, len)
    }

    /// Close the current array.
    ///
    /// # Errors
    ///
    /// Fails if the current frame is not an array, if a definite-length
    /// array still expects elements, or on a sink error.
    pub fn write_end_array(&mut self) -> Result<(), EncodeError> {
        self.check_open()?;
        self.end_container(FrameKind::Array)
    }

    /// Open an indefinite-length map.
    ///
    /// # Errors
    ///
    /// Fails on context misuse, depth limit, or a sink error.
    pub fn write_start_object(&mut self) -> Result<(), EncodeError> {
        self.verify_value_write()?;
        self.push_frame(FrameKind::Object, None)?;
        self.put_byte(BYTE_MAP_INDEFINITE)
    }

    /// Open a definite-length map of exactly `len` key/value pairs.
    ///
    /// # Errors
    ///
    /// Fails on context misuse, depth limit, or a sink error.
    pub fn write_start_object_sized(&mut self, len: u64) -> Result<(), EncodeError> {
        self.verify_value_write()?;
        // names and values each count one
        let remaining = match len.checked_mul(2) {
            Some(n) => n,
            None => return Err(self.err(ErrorCode::LengthOverflow)),
        };
        self.push_frame(FrameKind::Object, Some(remaining))?;
        self.write_head(PREFIX_MAP, len)
    }

    /// Close the current map.
    ///
    /// # Errors
    ///
    /// Fails if the current frame is not a map, if a definite-length map
    /// still expects entries, or on a sink error.
    pub fn write_end_object(&mut self) -> Result<(), EncodeError> {
        self.check_open()?;
        self.end_container(FrameKind::Object)
    }

    /// Write a field name inside a map frame.
    ///
    /// Goes through the text writer, so stringref applies like for any
    /// other text string.
    ///
    /// # Errors
    ///
    /// Fails if the current frame is not a map expecting a name, or on a
    /// sink error.
    pub fn write_field_name(&mut self, name: &str) -> Result<(), EncodeError> {
        self.check_open()?;
        if let Err(code) = self.context.note_field_name() {
            return Err(self.err(code));
        }
        self.emit_text(name)
    }

    /*
     * Scalar output
     */

    /// Write `null`.
    ///
    /// # Errors
    ///
    /// Fails on context misuse or a sink error.
    pub fn write_null(&mut self) -> Result<(), EncodeError> {
        self.verify_value_write()?;
        self.put_byte(BYTE_NULL)
    }

    /// Write a boolean.
    ///
    /// # Errors
    ///
    /// Fails on context misuse or a sink error.
    pub fn write_bool(&mut self, state: bool) -> Result<(), EncodeError> {
        self.verify_value_write()?;
        self.put_byte(if state { BYTE_TRUE } else { BYTE_FALSE })
    }

    /// Write a 32-bit signed integer.
    ///
    /// With minimal ints enabled the argument takes the shortest width that
    /// retains the value; otherwise it is always four bytes.
    ///
    /// # Errors
    ///
    /// Fails on context misuse or a sink error.
    pub fn write_i32(&mut self, v: i32) -> Result<(), EncodeError> {
        self.verify_value_write()?;
        let (prefix, mag) = transform_i32(v);
        if self.minimal_ints {
            self.write_head(prefix, u64::from(mag))
        } else {
            self.write_head_u32(prefix, mag)
        }
    }

    /// Write a 64-bit signed integer.
    ///
    /// # Errors
    ///
    /// Fails on context misuse or a sink error.
    pub fn write_i64(&mut self, v: i64) -> Result<(), EncodeError> {
        self.verify_value_write()?;
        self.emit_i64(v)
    }

    /// Write a 128-bit signed integer, falling back to a bignum when the
    /// value does not fit 64 bits.
    ///
    /// # Errors
    ///
    /// Fails on context misuse or a sink error.
    pub fn write_i128(&mut self, v: i128) -> Result<(), EncodeError> {
        if let Ok(small) = i64::try_from(v) {
            return self.write_i64(small);
        }
        self.verify_value_write()?;
        let bytes = v.unsigned_abs().to_be_bytes();
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
        self.emit_bignum(v < 0, &bytes[start..])
    }

    /// Write a bignum: tag 2 (positive) or 3 (negative) followed by the
    /// big-endian magnitude as a byte string.
    ///
    /// The magnitude is written as given; for a negative value the caller
    /// supplies the magnitude of the negated value. Stringref applies to
    /// the magnitude byte string.
    ///
    /// # Errors
    ///
    /// Fails on context misuse or a sink error.
    pub fn write_bignum(&mut self, negative: bool, magnitude: &[u8]) -> Result<(), EncodeError> {
        self.verify_value_write()?;
        self.emit_bignum(negative, magnitude)
    }

    /// Write a decimal fraction: tag 4 wrapping `[-scale, unscaled]`.
    ///
    /// The exponent is the negated scale. The unscaled value uses a 32-bit
    /// form when it fits, the full 64-bit form up to 63 bits, and the
    /// bignum path beyond that.
    ///
    /// # Errors
    ///
    /// Fails on context misuse or a sink error.
    pub fn write_decimal(&mut self, unscaled: i128, scale: i32) -> Result<(), EncodeError> {
        self.verify_value_write()?;
        self.put_byte(BYTE_TAG_DECIMAL_FRACTION)?;
        self.put_byte(BYTE_ARRAY_2_ELEMENTS)?;
        // CBOR stores the exponent, callers supply a scale
        self.emit_int_minimal(-i64::from(scale))?;
        if let Ok(small) = i32::try_from(unscaled) {
            self.emit_int_minimal(i64::from(small))
        } else if let Ok(mid) = i64::try_from(unscaled) {
            let (prefix, mag) = transform_i64(mid);
            self.write_head_u64(prefix, mag)
        } else {
            let bytes = unscaled.unsigned_abs().to_be_bytes();
            let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
            self.emit_bignum(unscaled < 0, &bytes[start..])
        }
    }

    /// Write a 32-bit float (`0xFA` + big-endian bit pattern).
    ///
    /// # Errors
    ///
    /// Fails on context misuse or a sink error.
    pub fn write_f32(&mut self, v: f32) -> Result<(), EncodeError> {
        self.verify_value_write()?;
        self.emit_f32(v)
    }

    /// Write a 64-bit float (`0xFB` + big-endian bit pattern).
    ///
    /// With minimal doubles enabled, narrows to a 4-byte float when the
    /// round trip is exact; NaN therefore always stays 8 bytes wide.
    ///
    /// # Errors
    ///
    /// Fails on context misuse or a sink error.
    pub fn write_f64(&mut self, v: f64) -> Result<(), EncodeError> {
        self.verify_value_write()?;
        if self.minimal_doubles {
            self.emit_f64_minimal(v)
        } else {
            self.emit_f64(v)
        }
    }

    /// Write a text string from UTF-8 input.
    ///
    /// Always produces a definite-length item with the byte length in the
    /// head. Stringref lookup and insertion apply by encoded byte length.
    ///
    /// # Errors
    ///
    /// Fails on context misuse or a sink error.
    pub fn write_text(&mut self, text: &str) -> Result<(), EncodeError> {
        self.verify_value_write()?;
        self.emit_text(text)
    }

    /// Write a text string from UTF-16 code units.
    ///
    /// Inputs longer than the chunk limit are written in indefinite-length
    /// form, split so that no surrogate pair straddles a chunk boundary.
    /// Invalid surrogate sequences fail under strict transcoding and become
    /// U+FFFD when `LENIENT_UTF_ENCODING` is enabled.
    ///
    /// # Errors
    ///
    /// Fails on context misuse, invalid surrogates in strict mode, or a
    /// sink error.
    pub fn write_text_utf16(&mut self, units: &[u16]) -> Result<(), EncodeError> {
        self.verify_value_write()?;
        if units.is_empty() {
            return self.put_byte(BYTE_EMPTY_TEXT);
        }
        // Backreferences only apply to strings with a definite length. The
        // table must track exactly what a decoder sees, so the gate is
        // "takes a definite form", not "fits the long class".
        let definite =
            units.len() <= MAX_MEDIUM_STRING_CHARS || units.len() <= self.max_long_chars;
        let mut key = None;
        if self.refs.is_some() && definite {
            let candidate = String::from_utf16_lossy(units);
            if let Some(index) = self.refs.as_ref().and_then(|r| r.get_text(&candidate)) {
                return self.write_backref(index);
            }
            key = Some(candidate);
        }
        let actual = self.emit_text_utf16(units)?;
        if let (Some(key), Some(actual)) = (key, actual) {
            if let Some(refs) = self.refs.as_mut() {
                refs.maybe_insert_text(&key, actual);
            }
        }
        Ok(())
    }

    /// Write a byte string.
    ///
    /// # Errors
    ///
    /// Fails on context misuse or a sink error.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), EncodeError> {
        self.verify_value_write()?;
        self.emit_bytes_item(data)
    }

    /// Write a byte string of known length copied from `source`.
    ///
    /// Without stringref the data streams through the output buffer in
    /// buffer-sized spans; with stringref it is read up front so the table
    /// can be consulted.
    ///
    /// # Errors
    ///
    /// Fails on context misuse, a sink error, a read error, or with
    /// [`ErrorCode::SourceUnderflow`] if `source` ends before `len` bytes.
    pub fn write_bytes_from<R: io::Read>(
        &mut self,
        source: &mut R,
        len: usize,
    ) -> Result<(), EncodeError> {
        self.verify_value_write()?;
        if self.refs.is_some() {
            let mut data = vec![0u8; len];
            let got = match read_fully(source, &mut data) {
                Ok(got) => got,
                Err(e) => return Err(self.src_err(e)),
            };
            if got < len {
                return Err(self.err(ErrorCode::SourceUnderflow((len - got) as u64)));
            }
            return self.emit_bytes_item(&data);
        }
        self.write_head(PREFIX_BYTES, len as u64)?;
        let mut remaining = len;
        while remaining > 0 {
            if self.tail >= self.buf.len() {
                self.flush_buffer()?;
            }
            let room = (self.buf.len() - self.tail).min(remaining);
            let count = match source.read(&mut self.buf[self.tail..self.tail + room]) {
                Ok(count) => count,
                Err(e) => return Err(self.src_err(e)),
            };
            if count == 0 {
                break;
            }
            self.tail += count;
            remaining -= count;
        }
        if remaining > 0 {
            return Err(self.err(ErrorCode::SourceUnderflow(remaining as u64)));
        }
        Ok(())
    }

    /*
     * Extended output: tags, raw bytes, contiguous slices
     */

    /// Write an explicit tag head; the next item written is the tagged one.
    ///
    /// # Errors
    ///
    /// Fails after close or on a sink error.
    pub fn write_tag(&mut self, tag_id: u64) -> Result<(), EncodeError> {
        self.check_open()?;
        self.write_head(PREFIX_TAG, tag_id)
    }

    /// Insert one byte into the output, bypassing all verification.
    ///
    /// Only use this if you really know what you are doing.
    ///
    /// # Errors
    ///
    /// Fails after close or on a sink error.
    pub fn write_raw_byte(&mut self, byte: u8) -> Result<(), EncodeError> {
        self.check_open()?;
        self.put_byte(byte)
    }

    /// Insert raw bytes into the output, bypassing all verification.
    ///
    /// Only use this if you really know what you are doing.
    ///
    /// # Errors
    ///
    /// Fails after close or on a sink error.
    pub fn write_raw_bytes(&mut self, data: &[u8]) -> Result<(), EncodeError> {
        self.check_open()?;
        self.copy_slice(data)
    }

    /// Write a whole `i32` slice as one definite-length array.
    ///
    /// # Errors
    ///
    /// Fails on context misuse or a sink error.
    pub fn write_i32_array(&mut self, values: &[i32]) -> Result<(), EncodeError> {
        self.verify_value_write()?;
        self.write_head(PREFIX_ARRAY, values.len() as u64)?;
        if self.minimal_ints {
            for &v in values {
                let (prefix, mag) = transform_i32(v);
                self.write_head(prefix, u64::from(mag))?;
            }
        } else {
            for &v in values {
                let (prefix, mag) = transform_i32(v);
                self.write_head_u32(prefix, mag)?;
            }
        }
        Ok(())
    }

    /// Write a whole `i64` slice as one definite-length array.
    ///
    /// # Errors
    ///
    /// Fails on context misuse or a sink error.
    pub fn write_i64_array(&mut self, values: &[i64]) -> Result<(), EncodeError> {
        self.verify_value_write()?;
        self.write_head(PREFIX_ARRAY, values.len() as u64)?;
        for &v in values {
            self.emit_i64(v)?;
        }
        Ok(())
    }

    /// Write a whole `f64` slice as one definite-length array.
    ///
    /// # Errors
    ///
    /// Fails on context misuse or a sink error.
    pub fn write_f64_array(&mut self, values: &[f64]) -> Result<(), EncodeError> {
        self.verify_value_write()?;
        self.write_head(PREFIX_ARRAY, values.len() as u64)?;
        if self.minimal_doubles {
            for &v in values {
                self.emit_f64_minimal(v)?;
            }
        } else {
            for &v in values {
                self.emit_f64(v)?;
            }
        }
        Ok(())
    }

    /*
     * Lifecycle
     */

    /// Flush buffered bytes to the sink, forwarding the flush when
    /// `FLUSH_PASSED_TO_SINK` is enabled. A no-op after close.
    ///
    /// # Errors
    ///
    /// Fails on a sink error, or if the encoder is poisoned.
    pub fn flush(&mut self) -> Result<(), EncodeError> {
        if self.closed {
            return Ok(());
        }
        if self.poisoned {
            return Err(EncodeError::new(ErrorCode::WriteAfterClose, self.offset()));
        }
        self.flush_buffer()?;
        if self.features.contains(EncoderFeatures::FLUSH_PASSED_TO_SINK) {
            if let Err(e) = self.sink.flush() {
                self.poisoned = true;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Close the encoder: terminate open containers (when
    /// `AUTO_CLOSE_CONTENT` is enabled), flush, settle the sink per
    /// `CLOSE_SINK` / `FLUSH_PASSED_TO_SINK`, and release the buffer to
    /// the pool. Closing twice is a no-op; closing a poisoned encoder only
    /// releases the buffer.
    ///
    /// # Errors
    ///
    /// Fails if terminating open containers detects a size mismatch, or on
    /// a sink error. The buffer is released either way.
    pub fn close(&mut self) -> Result<(), EncodeError> {
        if self.closed {
            return Ok(());
        }
        let result = if self.poisoned {
            Ok(())
        } else {
            self.finish_stream()
        };
        let buf = std::mem::take(&mut self.buf);
        if !buf.is_empty() {
            buffers::release(buf);
        }
        self.tail = 0;
        self.closed = true;
        result
    }

    /// Close the encoder and return the sink.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`close`](Self::close).
    pub fn into_sink(mut self) -> Result<S, EncodeError> {
        self.close()?;
        Ok(self.sink)
    }

    fn finish_stream(&mut self) -> Result<(), EncodeError> {
        if self.features.contains(EncoderFeatures::AUTO_CLOSE_CONTENT) {
            while let Some(kind) = self.context.current().map(|f| f.kind) {
                self.end_container(kind)?;
            }
        }
        self.flush_buffer()?;
        let settle = if self.features.contains(EncoderFeatures::CLOSE_SINK) {
            self.sink.close()
        } else if self.features.contains(EncoderFeatures::FLUSH_PASSED_TO_SINK) {
            self.sink.flush()
        } else {
            Ok(())
        };
        if let Err(e) = settle {
            self.poisoned = true;
            return Err(e);
        }
        Ok(())
    }

    /*
     * Context and error plumbing
     */

    #[inline]
    fn offset(&self) -> u64 {
        self.bytes_flushed + self.tail as u64
    }

    #[inline]
    fn err(&mut self, code: ErrorCode) -> EncodeError {
        self.poisoned = true;
        EncodeError::new(code, self.offset())
    }

    #[inline]
    fn src_err(&mut self, cause: io::Error) -> EncodeError {
        self.poisoned = true;
        EncodeError::io(cause, self.offset())
    }

    #[inline]
    fn check_open(&self) -> Result<(), EncodeError> {
        if self.closed || self.poisoned {
            return Err(EncodeError::new(ErrorCode::WriteAfterClose, self.offset()));
        }
        Ok(())
    }

    #[inline]
    fn verify_value_write(&mut self) -> Result<(), EncodeError> {
        self.check_open()?;
        if let Err(code) = self.context.note_value() {
            return Err(self.err(code));
        }
        Ok(())
    }

    fn push_frame(&mut self, kind: FrameKind, remaining: Option<u64>) -> Result<(), EncodeError> {
        if self.context.depth() >= self.limits.max_nesting_depth {
            return Err(self.err(ErrorCode::DepthLimitExceeded));
        }
        self.context.push(kind, remaining);
        Ok(())
    }

    fn end_container(&mut self, kind: FrameKind) -> Result<(), EncodeError> {
        match self.context.pop(kind) {
            Ok(true) => self.put_byte(BYTE_BREAK),
            Ok(false) => Ok(()),
            Err(code) => Err(self.err(code)),
        }
    }

    /*
     * Head encoding
     */

    /// Emit an item head with the smallest argument width that retains
    /// `value`.
    fn write_head(&mut self, prefix: u8, value: u64) -> Result<(), EncodeError> {
        self.ensure_room(9)?;
        let ix = self.tail;
        if value < 24 {
            self.buf[ix] = prefix + value as u8;
            self.tail = ix + 1;
        } else if value <= 0xff {
            self.buf[ix] = prefix + SUFFIX_U8;
            self.buf[ix + 1] = value as u8;
            self.tail = ix + 2;
        } else if value <= 0xffff {
            self.buf[ix] = prefix + SUFFIX_U16;
            self.buf[ix + 1..ix + 3].copy_from_slice(&(value as u16).to_be_bytes());
            self.tail = ix + 3;
        } else if value <= 0xffff_ffff {
            self.buf[ix] = prefix + SUFFIX_U32;
            self.buf[ix + 1..ix + 5].copy_from_slice(&(value as u32).to_be_bytes());
            self.tail = ix + 5;
        } else {
            self.buf[ix] = prefix + SUFFIX_U64;
            self.buf[ix + 1..ix + 9].copy_from_slice(&value.to_be_bytes());
            self.tail = ix + 9;
        }
        Ok(())
    }

    /// Emit an item head with a forced four-byte argument.
    fn write_head_u32(&mut self, prefix: u8, value: u32) -> Result<(), EncodeError> {
        self.ensure_room(5)?;
        let ix = self.tail;
        self.buf[ix] = prefix + SUFFIX_U32;
        self.buf[ix + 1..ix + 5].copy_from_slice(&value.to_be_bytes());
        self.tail = ix + 5;
        Ok(())
    }

    /// Emit an item head with a forced eight-byte argument.
    fn write_head_u64(&mut self, prefix: u8, value: u64) -> Result<(), EncodeError> {
        self.ensure_room(9)?;
        let ix = self.tail;
        self.buf[ix] = prefix + SUFFIX_U64;
        self.buf[ix + 1..ix + 9].copy_from_slice(&value.to_be_bytes());
        self.tail = ix + 9;
        Ok(())
    }

    fn write_backref(&mut self, index: u64) -> Result<(), EncodeError> {
        self.write_head(PREFIX_TAG, TAG_ID_STRINGREF)?;
        self.write_head(PREFIX_UINT, index)
    }

    /*
     * Number emission
     */

    fn emit_i64(&mut self, v: i64) -> Result<(), EncodeError> {
        let (prefix, mag) = transform_i64(v);
        if self.minimal_ints && mag <= u64::from(u32::MAX) {
            self.write_head(prefix, mag)
        } else {
            self.write_head_u64(prefix, mag)
        }
    }

    /// Signed integer in shortest form, independent of the minimal-ints
    /// feature (decimal fractions and backreference indices use this).
    fn emit_int_minimal(&mut self, v: i64) -> Result<(), EncodeError> {
        let (prefix, mag) = transform_i64(v);
        self.write_head(prefix, mag)
    }

    fn emit_bignum(&mut self, negative: bool, magnitude: &[u8]) -> Result<(), EncodeError> {
        self.put_byte(if negative {
            BYTE_TAG_BIGNUM_NEG
        } else {
            BYTE_TAG_BIGNUM_POS
        })?;
        self.emit_bytes_item(magnitude)
    }

    fn emit_f32(&mut self, v: f32) -> Result<(), EncodeError> {
        self.ensure_room(5)?;
        let ix = self.tail;
        self.buf[ix] = BYTE_FLOAT32;
        self.buf[ix + 1..ix + 5].copy_from_slice(&v.to_bits().to_be_bytes());
        self.tail = ix + 5;
        Ok(())
    }

    fn emit_f64(&mut self, v: f64) -> Result<(), EncodeError> {
        self.ensure_room(9)?;
        let ix = self.tail;
        self.buf[ix] = BYTE_FLOAT64;
        self.buf[ix + 1..ix + 9].copy_from_slice(&v.to_bits().to_be_bytes());
        self.tail = ix + 9;
        Ok(())
    }

    #[allow(clippy::float_cmp)]
    fn emit_f64_minimal(&mut self, v: f64) -> Result<(), EncodeError> {
        let narrow = v as f32;
        if f64::from(narrow) == v {
            self.emit_f32(narrow)
        } else {
            self.emit_f64(v)
        }
    }

    /*
     * Text and binary emission
     */

    fn emit_text(&mut self, text: &str) -> Result<(), EncodeError> {
        if text.is_empty() {
            return self.put_byte(BYTE_EMPTY_TEXT);
        }
        if let Some(refs) = self.refs.as_ref() {
            if let Some(index) = refs.get_text(text) {
                return self.write_backref(index);
            }
        }
        self.write_head(PREFIX_TEXT, text.len() as u64)?;
        self.copy_slice(text.as_bytes())?;
        if let Some(refs) = self.refs.as_mut() {
            refs.maybe_insert_text(text, text.len());
        }
        Ok(())
    }

    /// Definite-length forms by code-unit count; returns the encoded byte
    /// length, or `None` when the input was written in chunked form.
    fn emit_text_utf16(&mut self, units: &[u16]) -> Result<Option<usize>, EncodeError> {
        let len = units.len();
        if len <= MAX_SHORT_STRING_CHARS {
            self.ensure_string_space(MAX_SHORT_STRING_BYTES)?;
            let actual = self.transcode(self.tail + 1, units)?;
            let ix = self.tail;
            if actual <= MAX_SHORT_STRING_CHARS {
                self.buf[ix] = PREFIX_TEXT + actual as u8;
                self.tail = ix + 1 + actual;
            } else {
                // expanded past the inline form, shift for a wider head
                self.buf.copy_within(ix + 1..ix + 1 + actual, ix + 2);
                self.buf[ix] = PREFIX_TEXT + SUFFIX_U8;
                self.buf[ix + 1] = actual as u8;
                self.tail = ix + 2 + actual;
            }
            return Ok(Some(actual));
        }
        if len <= MAX_MEDIUM_STRING_CHARS {
            self.ensure_string_space(MAX_MEDIUM_STRING_BYTES)?;
            let actual = self.transcode(self.tail + 2, units)?;
            let ix = self.tail;
            if actual <= MAX_MEDIUM_STRING_CHARS {
                self.buf[ix] = PREFIX_TEXT + SUFFIX_U8;
                self.buf[ix + 1] = actual as u8;
                self.tail = ix + 2 + actual;
            } else {
                self.buf.copy_within(ix + 2..ix + 2 + actual, ix + 3);
                self.buf[ix] = PREFIX_TEXT + SUFFIX_U16;
                self.buf[ix + 1..ix + 3].copy_from_slice(&(actual as u16).to_be_bytes());
                self.tail = ix + 3 + actual;
            }
            return Ok(Some(actual));
        }
        if len <= self.max_long_chars {
            self.ensure_string_space(self.max_long_bytes)?;
            let actual = self.transcode(self.tail + 3, units)?;
            // max_long_chars is clamped so actual can never exceed 0xffff
            debug_assert!(actual <= 0xffff);
            let ix = self.tail;
            self.buf[ix] = PREFIX_TEXT + SUFFIX_U16;
            self.buf[ix + 1..ix + 3].copy_from_slice(&(actual as u16).to_be_bytes());
            self.tail = ix + 3 + actual;
            return Ok(Some(actual));
        }
        self.emit_chunked_text(units)?;
        Ok(None)
    }

    fn emit_chunked_text(&mut self, mut units: &[u16]) -> Result<(), EncodeError> {
        self.put_byte(BYTE_TEXT_INDEFINITE)?;
        while units.len() > self.max_long_chars {
            self.ensure_string_space(self.max_long_bytes)?;
            let mut amount = self.max_long_chars;
            // never split a surrogate pair across chunks
            let last = units[amount - 1];
            if (SURR1_FIRST..=SURR1_LAST).contains(&last) {
                amount -= 1;
            }
            let actual = self.transcode(self.tail + 3, &units[..amount])?;
            // chunk size is clamped so actual can never exceed 0xffff
            debug_assert!(actual <= 0xffff);
            let ix = self.tail;
            self.buf[ix] = PREFIX_TEXT + SUFFIX_U16;
            self.buf[ix + 1..ix + 3].copy_from_slice(&(actual as u16).to_be_bytes());
            self.tail = ix + 3 + actual;
            units = &units[amount..];
        }
        if !units.is_empty() {
            self.emit_text_utf16(units)?;
        }
        self.put_byte(BYTE_BREAK)
    }

    #[inline]
    fn transcode(&mut self, at: usize, units: &[u16]) -> Result<usize, EncodeError> {
        match utf8::encode(&mut self.buf, at, units, self.lenient_utf) {
            Ok(n) => Ok(n),
            Err(code) => Err(self.err(code)),
        }
    }

    fn emit_bytes_item(&mut self, data: &[u8]) -> Result<(), EncodeError> {
        if let Some(refs) = self.refs.as_ref() {
            if let Some(index) = refs.get_bytes(data) {
                return self.write_backref(index);
            }
        }
        self.write_head(PREFIX_BYTES, data.len() as u64)?;
        self.copy_slice(data)?;
        if let Some(refs) = self.refs.as_mut() {
            refs.maybe_insert_bytes(data);
        }
        Ok(())
    }

    /*
     * Buffer handling
     */

    /// Make sure at least `needed` bytes are free, flushing if not. Callers
    /// reserve their full worst case up front so no write is ever split.
    #[inline]
    fn ensure_room(&mut self, needed: usize) -> Result<(), EncodeError> {
        if self.tail + needed >= self.buf.len() {
            self.flush_buffer()?;
        }
        Ok(())
    }

    #[inline]
    fn ensure_string_space(&mut self, needed: usize) -> Result<(), EncodeError> {
        if self.tail + needed + 3 > self.buf.len() {
            self.flush_buffer()?;
        }
        Ok(())
    }

    #[inline]
    fn put_byte(&mut self, b: u8) -> Result<(), EncodeError> {
        if self.tail >= self.buf.len() {
            self.flush_buffer()?;
        }
        self.buf[self.tail] = b;
        self.tail += 1;
        Ok(())
    }

    fn copy_slice(&mut self, data: &[u8]) -> Result<(), EncodeError> {
        if data.is_empty() {
            return Ok(());
        }
        if self.tail + data.len() >= self.buf.len() {
            return self.copy_slice_long(data);
        }
        self.buf[self.tail..self.tail + data.len()].copy_from_slice(data);
        self.tail += data.len();
        Ok(())
    }

    fn copy_slice_long(&mut self, mut data: &[u8]) -> Result<(), EncodeError> {
        if self.tail >= self.buf.len() {
            self.flush_buffer()?;
        }
        loop {
            let n = data.len().min(self.buf.len() - self.tail);
            self.buf[self.tail..self.tail + n].copy_from_slice(&data[..n]);
            self.tail += n;
            data = &data[n..];
            if data.is_empty() {
                return Ok(());
            }
            self.flush_buffer()?;
        }
    }

    fn flush_buffer(&mut self) -> Result<(), EncodeError> {
        if self.tail > 0 {
            if let Err(e) = self.sink.write(&self.buf[..self.tail]) {
                self.poisoned = true;
                return Err(e);
            }
            self.bytes_flushed += self.tail as u64;
            self.tail = 0;
        }
        Ok(())
    }
}

/// Split a signed 32-bit value into major-type prefix and unsigned
/// argument; negatives map to `-n - 1` on the unsigned magnitude so
/// `i32::MIN` cannot overflow.
#[inline]
#[allow(clippy::cast_sign_loss)]
const fn transform_i32(v: i32) -> (u8, u32) {
    if v < 0 {
        (PREFIX_NINT, !(v as u32))
    } else {
        (PREFIX_UINT, v as u32)
    }
}

#[inline]
#[allow(clippy::cast_sign_loss)]
const fn transform_i64(v: i64) -> (u8, u64) {
    if v < 0 {
        (PREFIX_NINT, !(v as u64))
    } else {
        (PREFIX_UINT, v as u64)
    }
}

fn read_fully<R: io::Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut got = 0;
    while got < buf.len() {
        let n = source.read(&mut buf[got..])?;
        if n == 0 {
            break;
        }
        got += n;
    }
    Ok(got)
}
