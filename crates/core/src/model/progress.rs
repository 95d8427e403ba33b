/// Where playback stands within one list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressState {
    pub index: usize,
    /// Repetitions already completed for the current block.
    pub current_repeat: u32,
}

impl ProgressState {
    #[must_use]
    pub fn new(index: usize, current_repeat: u32) -> Self {
        Self {
            index,
            current_repeat,
        }
    }

    /// Falls back to the start of the list when the stored index is out of range.
    #[must_use]
    pub fn clamped(self, len: usize) -> Self {
        if self.index < len {
            self
        } else {
            Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_resets_out_of_range_index() {
        assert_eq!(ProgressState::new(3, 1).clamped(4), ProgressState::new(3, 1));
        assert_eq!(ProgressState::new(4, 1).clamped(4), ProgressState::default());
        assert_eq!(ProgressState::new(0, 2).clamped(0), ProgressState::default());
    }
}
