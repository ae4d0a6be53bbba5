//! UTF-16 → UTF-8 transcoding into the output buffer.
//!
//! Callers reserve worst-case room (three bytes per code unit) before
//! calling in, so the writers here index the buffer directly and never
//! flush mid-run.

#![allow(clippy::cast_possible_truncation)]

use crate::constants::{SURR1_FIRST, SURR1_LAST, SURR2_FIRST, SURR2_LAST};
use crate::error::ErrorCode;

const REPLACEMENT: [u8; 3] = [0xef, 0xbf, 0xbd];

/// Encode `units` into `buf` starting at `from`; returns the number of
/// bytes written.
///
/// The ASCII loop handles the common case and defers to the general loop on
/// the first multi-byte unit; both produce identical bytes for the same
/// input. With `lenient` set, invalid surrogate sequences become U+FFFD;
/// otherwise they fail with a code naming the offending unit(s).
#[inline]
pub(crate) fn encode(
    buf: &mut [u8],
    from: usize,
    units: &[u16],
    lenient: bool,
) -> Result<usize, ErrorCode> {
    let mut ptr = from;
    for (i, &c) in units.iter().enumerate() {
        if c > 0x7f {
            let tail = encode_multibyte(buf, ptr, &units[i..], lenient)?;
            return Ok(ptr - from + tail);
        }
        buf[ptr] = c as u8;
        ptr += 1;
    }
    Ok(ptr - from)
}

/// General loop, entered at the first unit above 0x7F.
fn encode_multibyte(
    buf: &mut [u8],
    from: usize,
    units: &[u16],
    lenient: bool,
) -> Result<usize, ErrorCode> {
    let mut ptr = from;
    let mut i = 0;
    while i < units.len() {
        let c = units[i];
        i += 1;
        if c <= 0x7f {
            buf[ptr] = c as u8;
            ptr += 1;
            continue;
        }
        if c < 0x800 {
            buf[ptr] = 0xc0 | (c >> 6) as u8;
            buf[ptr + 1] = 0x80 | (c & 0x3f) as u8;
            ptr += 2;
            continue;
        }
        if !(SURR1_FIRST..=SURR2_LAST).contains(&c) {
            buf[ptr] = 0xe0 | (c >> 12) as u8;
            buf[ptr + 1] = 0x80 | ((c >> 6) & 0x3f) as u8;
            buf[ptr + 2] = 0x80 | (c & 0x3f) as u8;
            ptr += 3;
            continue;
        }
        // Surrogate range. A valid pair needs a high start and a low
        // follower; the follower is consumed only when valid.
        if c <= SURR1_LAST {
            if let Some(&d) = units.get(i) {
                if (SURR2_FIRST..=SURR2_LAST).contains(&d) {
                    i += 1;
                    ptr = write_pair(buf, ptr, c, d);
                    continue;
                }
                if !lenient {
                    return Err(ErrorCode::InvalidSurrogatePair(c, d));
                }
                ptr = write_replacement(buf, ptr);
                continue;
            }
            if !lenient {
                return Err(ErrorCode::UnmatchedHighSurrogate(c));
            }
        } else if !lenient {
            return Err(ErrorCode::InvalidSurrogateStart(c));
        }
        ptr = write_replacement(buf, ptr);
    }
    Ok(ptr - from)
}

#[inline]
fn write_pair(buf: &mut [u8], ptr: usize, hi: u16, lo: u16) -> usize {
    let c = 0x10000 + ((u32::from(hi) - u32::from(SURR1_FIRST)) << 10)
        + (u32::from(lo) - u32::from(SURR2_FIRST));
    buf[ptr] = 0xf0 | (c >> 18) as u8;
    buf[ptr + 1] = 0x80 | ((c >> 12) & 0x3f) as u8;
    buf[ptr + 2] = 0x80 | ((c >> 6) & 0x3f) as u8;
    buf[ptr + 3] = 0x80 | (c & 0x3f) as u8;
    ptr + 4
}

#[inline]
fn write_replacement(buf: &mut [u8], ptr: usize) -> usize {
    buf[ptr..ptr + 3].copy_from_slice(&REPLACEMENT);
    ptr + 3
}
