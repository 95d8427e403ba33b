use phrase_core::model::{Language, PlaybackSettings, PlaybackSettingsDraft};
use phrase_core::playback::PlaybackSnapshot;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::error::EngineError;
use crate::playback::events::PlaybackEvent;

pub(crate) type Reply<T> = oneshot::Sender<T>;

pub(crate) enum Command {
    Start(Reply<Result<(), EngineError>>),
    Pause(Reply<()>),
    Resume(Reply<()>),
    Toggle(Reply<Result<(), EngineError>>),
    Stop(Reply<()>),
    Next(Reply<()>),
    Prev(Reply<()>),
    ApplySettings(
        PlaybackSettingsDraft,
        Reply<Result<PlaybackSettings, EngineError>>,
    ),
    SpeakCurrent(Language, Reply<()>),
    Snapshot(Reply<PlaybackSnapshot>),
    Shutdown(Reply<()>),
}

/// Cloneable front door to a running playback engine.
///
/// Every call waits until the engine has carried out the command, so a
/// caller observing events afterwards sees its effects.
#[derive(Clone)]
pub struct PlaybackHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl PlaybackHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<Command>,
        events: broadcast::Sender<PlaybackEvent>,
    ) -> Self {
        Self { commands, events }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// # Errors
    ///
    /// `EngineError::EmptyList` when there is nothing to play.
    pub async fn start(&self) -> Result<(), EngineError> {
        self.request(Command::Start).await?
    }

    /// # Errors
    ///
    /// `EngineError::Closed` if the engine is gone.
    pub async fn pause(&self) -> Result<(), EngineError> {
        self.request(Command::Pause).await
    }

    /// # Errors
    ///
    /// `EngineError::Closed` if the engine is gone.
    pub async fn resume(&self) -> Result<(), EngineError> {
        self.request(Command::Resume).await
    }

    /// Play/pause button: start, pause or resume depending on state.
    ///
    /// # Errors
    ///
    /// `EngineError::EmptyList` when starting an empty list.
    pub async fn toggle(&self) -> Result<(), EngineError> {
        self.request(Command::Toggle).await?
    }

    /// # Errors
    ///
    /// `EngineError::Closed` if the engine is gone.
    pub async fn stop(&self) -> Result<(), EngineError> {
        self.request(Command::Stop).await
    }

    /// # Errors
    ///
    /// `EngineError::Closed` if the engine is gone.
    pub async fn next(&self) -> Result<(), EngineError> {
        self.request(Command::Next).await
    }

    /// # Errors
    ///
    /// `EngineError::Closed` if the engine is gone.
    pub async fn prev(&self) -> Result<(), EngineError> {
        self.request(Command::Prev).await
    }

    /// Validate, persist and apply new settings. Returns the settings as
    /// applied, including any freshly drawn shuffle seed.
    ///
    /// # Errors
    ///
    /// `EngineError::Settings` for invalid values.
    pub async fn apply_settings(
        &self,
        draft: PlaybackSettingsDraft,
    ) -> Result<PlaybackSettings, EngineError> {
        self.request(|reply| Command::ApplySettings(draft, reply))
            .await?
    }

    /// Speak the current phrase in `language` without affecting playback.
    ///
    /// # Errors
    ///
    /// `EngineError::Closed` if the engine is gone.
    pub async fn speak_current(&self, language: Language) -> Result<(), EngineError> {
        self.request(|reply| Command::SpeakCurrent(language, reply))
            .await
    }

    /// # Errors
    ///
    /// `EngineError::Closed` if the engine is gone.
    pub async fn snapshot(&self) -> Result<PlaybackSnapshot, EngineError> {
        self.request(Command::Snapshot).await
    }

    /// Stop playback and end the engine task.
    ///
    /// # Errors
    ///
    /// `EngineError::Closed` if the engine is already gone.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.request(Command::Shutdown).await
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| EngineError::Closed)?;
        rx.await.map_err(|_| EngineError::Closed)
    }
}
