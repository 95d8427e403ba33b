use crate::model::ProgressState;

/// Repeat-block rules: replay each block of `length` phrases `count` extra
/// times before moving on. `count == 0` disables repetition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatBlock {
    pub length: u32,
    pub count: u32,
}

impl RepeatBlock {
    #[must_use]
    pub fn new(length: u32, count: u32) -> Self {
        Self {
            length: length.max(1),
            count,
        }
    }

    /// Cursor after one automatic advance through a list of `len` phrases.
    ///
    /// The index wraps at the end of the list. Crossing into a new block
    /// (including the wrap to 0) bumps the repeat counter and rewinds to the
    /// start of the block just played, until the counter passes `count`.
    /// With `miss_one` set the crossing is neither counted nor replayed.
    #[must_use]
    pub fn advance(self, from: ProgressState, len: usize, miss_one: bool) -> ProgressState {
        if len == 0 {
            return ProgressState::default();
        }
        let length = self.length as usize;
        let mut next = ProgressState::new((from.index + 1) % len, from.current_repeat);

        if self.count > 0 && self.crosses_boundary(from, len) && !miss_one {
            next.current_repeat += 1;
            if next.current_repeat > self.count {
                next.current_repeat = 0;
            } else {
                next.index = (from.index / length) * length;
            }
        }
        next
    }

    /// True when the next automatic advance from `from` enters a new block,
    /// counting the wrap to 0.
    #[must_use]
    pub fn crosses_boundary(self, from: ProgressState, len: usize) -> bool {
        len > 0 && ((from.index + 1) % len) % self.length as usize == 0
    }
}
