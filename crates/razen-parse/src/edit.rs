use razen_yellow::{LineIndex, Point};
use text_size::TextSize;
use thiserror::Error;

/// Replacement of `old_text[start..old_end]` by `new_text[start..new_end]`.
///
/// Points are informational; only byte offsets are used by the parser.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct InputEdit {
    pub start_byte: TextSize,
    pub old_end_byte: TextSize,
    pub new_end_byte: TextSize,
    pub start_point: Point,
    pub old_end_point: Point,
    pub new_end_point: Point,
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum EditError {
    #[error("old end {old_end:?} is before the edit start {start:?}")]
    OldEndBeforeStart { start: TextSize, old_end: TextSize },
    #[error("new end {new_end:?} is before the edit start {start:?}")]
    NewEndBeforeStart { start: TextSize, new_end: TextSize },
    #[error("old end {old_end:?} is beyond the old text ({len:?} bytes)")]
    OldEndOutOfBounds { old_end: TextSize, len: TextSize },
    #[error("new end {new_end:?} is beyond the new text ({len:?} bytes)")]
    NewEndOutOfBounds { new_end: TextSize, len: TextSize },
    #[error("new text has {actual:?} bytes but the edit implies {expected:?}")]
    LengthMismatch { expected: TextSize, actual: TextSize },
}

impl InputEdit {
    pub fn new(start: TextSize, old_end: TextSize, new_end: TextSize) -> Self {
        Self { start_byte: start, old_end_byte: old_end, new_end_byte: new_end, ..Self::default() }
    }

    /// Fills in the points from the texts before and after the edit.
    pub fn with_points(mut self, old: &LineIndex, new: &LineIndex) -> Self {
        self.start_point = old.point(self.start_byte);
        self.old_end_point = old.point(self.old_end_byte);
        self.new_end_point = new.point(self.new_end_byte);
        self
    }

    /// Replaces `old[start..old_end]` with `insert`, returning the edit and
    /// the new text.
    pub fn replace(
        old: &[u8],
        start: usize,
        old_end: usize,
        insert: &[u8],
    ) -> Result<(Self, Vec<u8>), EditError> {
        let size = |offset: usize| TextSize::new(offset as u32);
        if old_end < start {
            return Err(EditError::OldEndBeforeStart { start: size(start), old_end: size(old_end) });
        }
        if old_end > old.len() {
            let (old_end, len) = (size(old_end), size(old.len()));
            return Err(EditError::OldEndOutOfBounds { old_end, len });
        }

        let mut text = Vec::with_capacity(old.len() - (old_end - start) + insert.len());
        text.extend_from_slice(&old[..start]);
        text.extend_from_slice(insert);
        text.extend_from_slice(&old[old_end..]);

        let edit = Self::new(size(start), size(old_end), size(start + insert.len()))
            .with_points(&LineIndex::new(old), &LineIndex::new(&text));
        Ok((edit, text))
    }

    pub fn validate(&self, old_len: TextSize, new_len: TextSize) -> Result<(), EditError> {
        let Self { start_byte: start, old_end_byte: old_end, new_end_byte: new_end, .. } = *self;
        if old_end < start {
            return Err(EditError::OldEndBeforeStart { start, old_end });
        }
        if new_end < start {
            return Err(EditError::NewEndBeforeStart { start, new_end });
        }
        if old_end > old_len {
            return Err(EditError::OldEndOutOfBounds { old_end, len: old_len });
        }
        if new_end > new_len {
            return Err(EditError::NewEndOutOfBounds { new_end, len: new_len });
        }
        let expected = old_len - old_end + new_end;
        if expected != new_len {
            return Err(EditError::LengthMismatch { expected, actual: new_len });
        }
        Ok(())
    }
}

/// A validated edit in byte offsets, narrowed to the bytes that changed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Change {
    pub(crate) start: TextSize,
    pub(crate) old_end: TextSize,
    pub(crate) new_end: TextSize,
}

impl Change {
    /// Drops the prefix and suffix that the old and new texts share inside
    /// the edited ranges.
    pub(crate) fn narrow(edit: &InputEdit, old: &[u8], new: &[u8]) -> Self {
        let mut start = usize::from(edit.start_byte);
        let mut old_end = usize::from(edit.old_end_byte);
        let mut new_end = usize::from(edit.new_end_byte);

        while start < old_end && start < new_end && old[start] == new[start] {
            start += 1;
        }
        while old_end > start && new_end > start && old[old_end - 1] == new[new_end - 1] {
            old_end -= 1;
            new_end -= 1;
        }

        Self {
            start: TextSize::new(start as u32),
            old_end: TextSize::new(old_end as u32),
            new_end: TextSize::new(new_end as u32),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.start == self.old_end && self.start == self.new_end
    }

    /// Maps an offset in the new text to the old text. Offsets inside the
    /// inserted bytes have no counterpart.
    pub(crate) fn to_old(self, offset: TextSize) -> Option<TextSize> {
        if offset < self.start {
            Some(offset)
        } else if offset >= self.new_end {
            Some(offset - self.new_end + self.old_end)
        } else {
            None
        }
    }

    /// Whether an old element spanning `start..` whose lexing looked at
    /// bytes up to `lookahead_end` may see different input now.
    pub(crate) fn affects(self, start: TextSize, lookahead_end: TextSize) -> bool {
        self.start < lookahead_end && self.old_end > start
    }
}
