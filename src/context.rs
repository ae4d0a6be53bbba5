use crate::error::ErrorCode;

/// Kind of an open container frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameKind {
    Array,
    Object,
}

/// One open array or map.
///
/// `remaining` is `None` for indefinite-length frames. For definite frames
/// it counts elements still to write; a map of N pairs starts at 2N since
/// each field name and each value decrements once.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    pub kind: FrameKind,
    pub remaining: Option<u64>,
    expect_name: bool,
}

/// Stack of open containers. The root frame is the empty stack; it accepts
/// any number of top-level values and can never be closed.
#[derive(Debug, Default)]
pub(crate) struct WriteContext {
    stack: Vec<Frame>,
}

impl WriteContext {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    #[inline]
    pub fn current(&self) -> Option<&Frame> {
        self.stack.last()
    }

    pub fn push(&mut self, kind: FrameKind, remaining: Option<u64>) {
        self.stack.push(Frame {
            kind,
            remaining,
            expect_name: matches!(kind, FrameKind::Object),
        });
    }

    /// Account for a value (scalar or container start) in the current frame.
    pub fn note_value(&mut self) -> Result<(), ErrorCode> {
        let Some(frame) = self.stack.last_mut() else {
            return Ok(());
        };
        if frame.expect_name {
            return Err(ErrorCode::ExpectingFieldName);
        }
        Self::consume_one(frame)?;
        if matches!(frame.kind, FrameKind::Object) {
            frame.expect_name = true;
        }
        Ok(())
    }

    /// Account for a field name in the current frame.
    pub fn note_field_name(&mut self) -> Result<(), ErrorCode> {
        let Some(frame) = self.stack.last_mut() else {
            return Err(ErrorCode::ExpectingValue);
        };
        if !matches!(frame.kind, FrameKind::Object) || !frame.expect_name {
            return Err(ErrorCode::ExpectingValue);
        }
        Self::consume_one(frame)?;
        frame.expect_name = false;
        Ok(())
    }

    /// Close the current frame, verifying its kind and element accounting.
    /// Returns whether a break byte must be emitted.
    pub fn pop(&mut self, kind: FrameKind) -> Result<bool, ErrorCode> {
        let wrong_kind = match kind {
            FrameKind::Array => ErrorCode::NotInArray,
            FrameKind::Object => ErrorCode::NotInObject,
        };
        let frame = self.stack.last().ok_or(wrong_kind)?;
        if frame.kind != kind {
            return Err(wrong_kind);
        }
        let needs_break = match frame.remaining {
            None => true,
            Some(0) => false,
            Some(n) => return Err(ErrorCode::ContainerUnderflow(n)),
        };
        self.stack.pop();
        Ok(needs_break)
    }

    #[inline]
    fn consume_one(frame: &mut Frame) -> Result<(), ErrorCode> {
        if let Some(count) = frame.remaining.as_mut() {
            *count = count.checked_sub(1).ok_or(ErrorCode::ContainerOverrun)?;
        }
        Ok(())
    }
}

