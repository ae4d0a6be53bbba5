//! Thread-local recycling of output buffers.
//!
//! An encoder borrows its buffer here at construction and hands it back on
//! close, so short-lived encoders on the same thread skip the allocation.

use std::cell::RefCell;

thread_local! {
    static RECYCLED: RefCell<Option<Vec<u8>>> = const { RefCell::new(None) };
}

/// Fetch a zeroed buffer of exactly `len` bytes, reusing the thread's
/// recycled buffer when it is large enough.
pub(crate) fn acquire(len: usize) -> Vec<u8> {
    let reused = RECYCLED.with(|slot| slot.borrow_mut().take());
    match reused {
        Some(mut buf) if buf.capacity() >= len => {
            buf.clear();
            buf.resize(len, 0);
            buf
        }
        _ => vec![0; len],
    }
}

/// Return a buffer for reuse. Keeps the larger of the stored and returned
/// buffers.
pub(crate) fn release(buf: Vec<u8>) {
    RECYCLED.with(|slot| {
        let mut slot = slot.borrow_mut();
        let keep = match slot.as_ref() {
            Some(held) => held.capacity() < buf.capacity(),
            None => true,
        };
        if keep {
            *slot = Some(buf);
        }
    });
}
