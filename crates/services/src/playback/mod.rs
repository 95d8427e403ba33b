//! Async driver around the core playback machine.

mod config;
mod engine;
mod events;
mod handle;

pub use config::EngineConfig;
pub use engine::{EngineDeps, spawn};
pub use events::{Notice, PlaybackEvent, RecognitionFeedback};
pub use handle::PlaybackHandle;
