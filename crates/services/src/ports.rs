//! Narrow interfaces to the speech devices the engine drives.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use phrase_core::model::{Language, VoiceGender};
use thiserror::Error;
use tokio::sync::broadcast;

//
// ─── SPEECH OUTPUT ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub language: Language,
    /// Category of the phrase; pre-recorded audio is organized by it.
    pub category: String,
    pub rate: f32,
    pub voice: VoiceGender,
}

/// How a request was actually voiced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechMode {
    Audio,
    Synthesis,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SpeechOutputError {
    #[error("speech output unavailable: {0}")]
    Unavailable(String),
    #[error("speech output failed: {0}")]
    Failed(String),
    #[error("speech was interrupted")]
    Interrupted,
}

/// Speaks text or plays recorded audio.
///
/// `speak` resolves when playback finished, failed or was stopped.
#[async_trait]
pub trait SpeechOutputPort: Send + Sync {
    async fn speak(&self, request: SpeechRequest) -> Result<SpeechMode, SpeechOutputError>;

    async fn stop(&self);
}

//
// ─── RECOGNITION ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecognitionErrorKind {
    PermissionDenied,
    NoHardware,
    Network,
    NoSpeech,
    Aborted,
}

impl RecognitionErrorKind {
    /// Errors that make recognition pointless for the rest of the session.
    #[must_use]
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::PermissionDenied | Self::NoHardware)
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Microphone access denied. Allow microphone access in the system settings."
            }
            Self::NoHardware => "No microphone available.",
            Self::Network => "Speech recognition network problem.",
            Self::NoSpeech => "No speech detected. Check the microphone.",
            Self::Aborted => "Listening stopped.",
        }
    }
}

impl fmt::Display for RecognitionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PermissionDenied => "permission-denied",
            Self::NoHardware => "no-hardware",
            Self::Network => "network",
            Self::NoSpeech => "no-speech",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionOutcome {
    Matched,
    Mismatch { heard: String },
    /// Stopped by the adapter itself, on `stop_recognition` or a restart.
    Cancelled,
    Error(RecognitionErrorKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttemptId(pub u64);

/// Terminal outcome of one recognition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionEvent {
    pub attempt: AttemptId,
    pub expected: String,
    pub outcome: RecognitionOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionRequest {
    pub expected: String,
    pub language: Language,
    pub timeout: Duration,
}

/// Listens for the learner repeating a phrase.
#[async_trait]
pub trait RecognitionPort: Send + Sync {
    /// Begin an attempt. Must not block on the attempt itself.
    async fn start_recognition(&self, request: RecognitionRequest);

    /// End the live attempt, if any.
    async fn stop_recognition(&self);

    fn subscribe(&self) -> broadcast::Receiver<RecognitionEvent>;
}

/// Single-shot speech-to-text backend wrapped by `RecognitionAdapter`.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Listen once and return the transcript.
    async fn recognize(&self, language: Language) -> Result<String, RecognitionErrorKind>;

    /// Abort a running `recognize`. Returns once the backend has stopped.
    async fn abort(&self);
}
