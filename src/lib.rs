//! # cborgen
//!
//! A streaming **CBOR encoder** (RFC 7049/8949) driven by structural and
//! scalar token events, for pipelines that produce JSON-style token streams
//! rather than in-memory values.
//!
//! ## Design principles
//!
//! - **Bytes leave on item boundaries.**
//!   Every write path reserves its worst case before touching the output
//!   buffer, so a flush never splits a multi-byte head, a UTF-8 sequence,
//!   or a surrogate pair.
//! - **Token order is verified as it goes.**
//!   Field names and values must alternate inside maps, definite-length
//!   containers must receive exactly the declared element count, and
//!   nesting depth is bounded by [`WriteLimits`].
//! - **Extensions are opt-in.**
//!   Stringref (tag 25 backreferences), the self-describe header, minimal
//!   doubles and lenient UTF-16 transcoding are all controlled by
//!   [`EncoderFeatures`] supplied at construction.
//!
//! ## Example
//!
//! ```
//! use cborgen::CborEncoder;
//!
//! let mut enc = CborEncoder::new(Vec::new());
//! enc.write_start_object_sized(1)?;
//! enc.write_field_name("a")?;
//! enc.write_i32(1)?;
//! enc.write_end_object()?;
//! let bytes = enc.into_sink()?;
//! assert_eq!(bytes, [0xa1, 0x61, b'a', 0x01]);
//! # Ok::<(), cborgen::EncodeError>(())
//! ```
//!
//! ## Safety
//!
//! This crate forbids `unsafe` code.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

mod buffers;
pub mod constants;
mod context;
mod encoder;
mod error;
mod features;
mod limits;
mod refs;
mod sink;
mod utf8;

pub use crate::encoder::CborEncoder;
pub use crate::error::{EncodeError, ErrorCode, ErrorKind};
pub use crate::features::EncoderFeatures;
pub use crate::limits::{WriteLimits, DEFAULT_BUFFER_LENGTH, DEFAULT_MAX_DEPTH, MIN_BUFFER_LENGTH};
pub use crate::sink::{ByteSink, IoSink};
