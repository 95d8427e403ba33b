//! Phrase sequencing, directions, repeat blocks and timing as a pure state
//! machine. The async driver lives in the services crate.

mod effect;
mod machine;
mod repeat;

pub use effect::{Effect, Leg, ListenCue, PhraseView, PlayerState, SpeechCue, Ticket, TimerKind};
pub use machine::{
    DEFAULT_NAV_DEBOUNCE, PlaybackError, PlaybackMachine, PlaybackSnapshot, Rebuilt,
};
pub use repeat::RepeatBlock;
