use std::time::Duration;

use crate::model::{Language, ListKey, ProgressState, VoiceGender};

/// Generation token carried by every speech request and timer.
///
/// A completion or firing whose ticket no longer matches the machine's
/// pending one is stale and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }

    pub(crate) fn from_generation(generation: u64) -> Self {
        Self(generation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Gap after a leg; firing moves on to the next leg or phrase.
    Advance,
    /// Coalescing window after manual navigation.
    Debounce,
}

/// Leg of a both-direction cycle. Single directions only use `First`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    First,
    Second,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Playing(Leg),
    Paused(Leg),
    Stopped,
}

/// What the display should show for the current phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseView {
    pub index: usize,
    pub total: usize,
    pub shown: Language,
    pub text: String,
    /// The other side of the pair.
    pub hint: String,
    pub category: String,
    pub context: Option<String>,
    pub leg: Leg,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechCue {
    /// `None` for on-demand speech that does not drive playback.
    pub ticket: Option<Ticket>,
    pub text: String,
    pub language: Language,
    pub category: String,
    pub rate: f32,
    pub voice: VoiceGender,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenCue {
    pub expected: String,
    pub language: Language,
    pub timeout: Duration,
}

/// Side effects requested by the playback machine, in execution order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Show(PhraseView),
    Speak(SpeechCue),
    StopSpeech,
    Listen(ListenCue),
    StopListening,
    Schedule {
        ticket: Ticket,
        kind: TimerKind,
        delay: Duration,
    },
    CancelTimer,
    /// Persist and announce the cursor for `key`.
    Progress {
        key: ListKey,
        state: ProgressState,
        total: usize,
    },
    StateChanged(PlayerState),
}
