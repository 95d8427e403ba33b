#![forbid(unsafe_code)]

pub mod error;
pub mod phrase_source;
pub mod playback;
pub mod ports;
pub mod progress;
pub mod recognition;
pub mod settings_service;
pub mod speech;

pub use phrase_core::Clock;

pub use error::{EngineError, PhraseSourceError, ProgressError, SettingsServiceError};
pub use phrase_source::{RawCatalog, RemotePhraseSource, RemoteSourceConfig, load_into};
pub use playback::{
    EngineConfig, EngineDeps, Notice, PlaybackEvent, PlaybackHandle, RecognitionFeedback,
};
pub use ports::{
    RecognitionErrorKind, RecognitionEvent, RecognitionOutcome, RecognitionPort,
    RecognitionRequest, SpeechMode, SpeechOutputError, SpeechOutputPort, SpeechRecognizer,
    SpeechRequest,
};
pub use progress::ProgressTracker;
pub use recognition::{NoRecognizer, RecognitionAdapter};
pub use settings_service::SettingsService;
pub use speech::FallbackSpeechOutput;
