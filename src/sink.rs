use std::io;

use crate::error::EncodeError;

/// An append-only byte receiver fed by the encoder's buffer flushes.
///
/// Implementations report failures as [`EncodeError`] so the encoder can
/// surface them verbatim. `flush` and `close` default to no-ops for sinks
/// without buffering of their own.
pub trait ByteSink {
    /// Append `bytes` to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying receiver fails.
    fn write(&mut self, bytes: &[u8]) -> Result<(), EncodeError>;

    /// Push any sink-side buffering through to the destination.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying receiver fails.
    fn flush(&mut self) -> Result<(), EncodeError> {
        Ok(())
    }

    /// Release the destination. Called at most once, by `close`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying receiver fails.
    fn close(&mut self) -> Result<(), EncodeError> {
        Ok(())
    }
}

impl ByteSink for Vec<u8> {
    #[inline]
    fn write(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Adapter turning any [`io::Write`] into a [`ByteSink`].
///
/// Write failures are wrapped as [`ErrorCode::Io`](crate::ErrorCode::Io)
/// with the cause preserved.
#[derive(Debug)]
pub struct IoSink<W> {
    inner: W,
    written: u64,
}

impl<W: io::Write> IoSink<W> {
    /// Wrap `inner`.
    #[must_use]
    pub const fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Total bytes successfully handed to the writer.
    #[inline]
    #[must_use]
    pub const fn written(&self) -> u64 {
        self.written
    }

    /// Unwrap the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> ByteSink for IoSink<W> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.inner
            .write_all(bytes)
            .map_err(|e| EncodeError::io(e, self.written))?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), EncodeError> {
        self.inner
            .flush()
            .map_err(|e| EncodeError::io(e, self.written))
    }

    fn close(&mut self) -> Result<(), EncodeError> {
        self.flush()
    }
}

