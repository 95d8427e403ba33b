use std::time::Duration;

use phrase_core::model::{ListKey, ProgressState};
use phrase_core::playback::{PhraseView, PlayerState};

use crate::ports::RecognitionErrorKind;

/// Everything a presentation layer needs to follow playback.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    PhraseShown(PhraseView),
    StateChanged(PlayerState),
    ProgressChanged {
        key: ListKey,
        state: ProgressState,
        total: usize,
    },
    /// The gap after a leg started; the next leg or phrase follows after `delay`.
    PauseStarted { delay: Duration },
    Recognition(RecognitionFeedback),
    SpeechFailed { text: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionFeedback {
    Listening { expected: String, timeout: Duration },
    Matched { expected: String },
    Mismatch { expected: String, heard: String },
    Notice(Notice),
    NoticeCleared,
}

/// A recognition problem shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: RecognitionErrorKind,
    pub message: String,
    /// Persistent notices stay until the session ends; others clear themselves.
    pub persistent: bool,
}
