use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;

use phrase_core::PhraseStore;
use phrase_core::model::{PlayOrder, PlaybackSettings, PlaybackSettingsDraft};
use phrase_core::playback::{Effect, PlaybackMachine, Rebuilt, SpeechCue, Ticket, TimerKind};
use phrase_core::shuffle::fresh_seed;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{Sleep, sleep};
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::playback::config::EngineConfig;
use crate::playback::events::{Notice, PlaybackEvent, RecognitionFeedback};
use crate::playback::handle::{Command, PlaybackHandle};
use crate::ports::{
    RecognitionErrorKind, RecognitionEvent, RecognitionOutcome, RecognitionPort,
    RecognitionRequest, SpeechMode, SpeechOutputError, SpeechOutputPort, SpeechRequest,
};
use crate::progress::ProgressTracker;
use crate::settings_service::SettingsService;

const COMMAND_CAPACITY: usize = 32;

/// Everything the engine owns once it is running.
pub struct EngineDeps {
    pub store: PhraseStore,
    pub tracker: ProgressTracker,
    pub settings: SettingsService,
    pub speech: Arc<dyn SpeechOutputPort>,
    pub recognition: Arc<dyn RecognitionPort>,
}

/// Load settings and progress, build the current list and start the engine
/// task. Playback itself waits for `start`.
///
/// # Errors
///
/// Returns `EngineError` if settings or progress cannot be read or written.
pub async fn spawn(config: EngineConfig, deps: EngineDeps) -> Result<PlaybackHandle, EngineError> {
    let EngineDeps {
        store,
        mut tracker,
        settings: settings_service,
        speech,
        recognition,
    } = deps;

    let mut settings = settings_service.load().await?;
    if settings.order() == PlayOrder::Random && settings.random_seed().is_none() {
        settings = settings.with_random_seed(Some(fresh_seed()));
        settings_service.store(&settings).await?;
    }

    let list = store.build_list(settings.list_type(), settings.order(), settings.random_seed());
    let key = store.list_key(settings.list_type(), settings.order());
    if tracker.invalidate_if_list_changed(&key).await? {
        debug!(list = %key, "switched to a different list");
    }
    let progress = tracker.snapshot(&key);
    info!(list = %key, index = progress.index, "playback engine ready");

    let machine = PlaybackMachine::new(settings, list, key, progress)
        .with_timing(config.timing)
        .with_nav_debounce(config.nav_debounce);

    let (command_tx, commands) = mpsc::channel(COMMAND_CAPACITY);
    let (speech_done_tx, speech_done) = mpsc::unbounded_channel();
    let (events, _) = broadcast::channel(config.event_capacity.max(1));
    let recognition_events = Some(recognition.subscribe());

    let engine = Engine {
        config,
        machine,
        store,
        tracker,
        settings: settings_service,
        speech,
        recognition,
        events: events.clone(),
        speech_done: speech_done_tx,
        timer: None,
        notice_clear: None,
    };
    tokio::spawn(engine.run(commands, speech_done, recognition_events));

    Ok(PlaybackHandle::new(command_tx, events))
}

//
// ─── ENGINE TASK ───────────────────────────────────────────────────────────────
//

struct SpeechDone {
    ticket: Option<Ticket>,
    text: String,
    result: Result<SpeechMode, SpeechOutputError>,
}

struct PendingTimer {
    ticket: Ticket,
    sleep: Pin<Box<Sleep>>,
}

struct Engine {
    config: EngineConfig,
    machine: PlaybackMachine,
    store: PhraseStore,
    tracker: ProgressTracker,
    settings: SettingsService,
    speech: Arc<dyn SpeechOutputPort>,
    recognition: Arc<dyn RecognitionPort>,
    events: broadcast::Sender<PlaybackEvent>,
    speech_done: mpsc::UnboundedSender<SpeechDone>,
    timer: Option<PendingTimer>,
    notice_clear: Option<Pin<Box<Sleep>>>,
}

impl Engine {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut speech_done: mpsc::UnboundedReceiver<SpeechDone>,
        mut recognition: Option<broadcast::Receiver<RecognitionEvent>>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown(reply)) => {
                        let effects = self.machine.stop();
                        self.execute(effects).await;
                        self.recognition.stop_recognition().await;
                        let _ = reply.send(());
                        break;
                    }
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                Some(done) = speech_done.recv() => self.on_speech_done(done).await,
                ticket = fire(&mut self.timer) => {
                    let effects = self.machine.on_timer(ticket);
                    self.execute(effects).await;
                }
                event = next_recognition(&mut recognition) => self.on_recognition(event).await,
                () = elapsed(&mut self.notice_clear) => {
                    self.emit(PlaybackEvent::Recognition(RecognitionFeedback::NoticeCleared));
                }
            }
        }
        info!("playback engine stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Start(reply) => {
                let result = match self.machine.start() {
                    Ok(effects) => {
                        self.execute(effects).await;
                        Ok(())
                    }
                    Err(err) => Err(err.into()),
                };
                let _ = reply.send(result);
            }
            Command::Toggle(reply) => {
                let result = match self.machine.toggle() {
                    Ok(effects) => {
                        self.execute(effects).await;
                        Ok(())
                    }
                    Err(err) => Err(err.into()),
                };
                let _ = reply.send(result);
            }
            Command::Pause(reply) => {
                let effects = self.machine.pause();
                self.execute(effects).await;
                let _ = reply.send(());
            }
            Command::Resume(reply) => {
                let effects = self.machine.resume();
                self.execute(effects).await;
                let _ = reply.send(());
            }
            Command::Stop(reply) => {
                let effects = self.machine.stop();
                self.execute(effects).await;
                let _ = reply.send(());
            }
            Command::Next(reply) => {
                let effects = self.machine.next();
                self.execute(effects).await;
                let _ = reply.send(());
            }
            Command::Prev(reply) => {
                let effects = self.machine.prev();
                self.execute(effects).await;
                let _ = reply.send(());
            }
            Command::SpeakCurrent(language, reply) => {
                let effects = self.machine.speak_current(language);
                self.execute(effects).await;
                let _ = reply.send(());
            }
            Command::ApplySettings(draft, reply) => {
                let result = self.apply_settings(draft).await;
                let _ = reply.send(result);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.machine.snapshot());
            }
            // Handled by the loop.
            Command::Shutdown(reply) => {
                let _ = reply.send(());
            }
        }
    }

    async fn apply_settings(
        &mut self,
        draft: PlaybackSettingsDraft,
    ) -> Result<PlaybackSettings, EngineError> {
        let current = self.machine.settings().clone();
        // A draft built from the current settings carries the current seed;
        // only a different one counts as a request.
        let requested_seed = draft.random_seed.filter(|seed| Some(*seed) != current.random_seed());
        let next = draft.validate()?;
        let list_changed = current.list_differs(&next);

        let seed = match requested_seed {
            Some(seed) => Some(seed),
            None if next.order() == PlayOrder::Random
                && (list_changed || current.random_seed().is_none()) =>
            {
                Some(fresh_seed())
            }
            None => current.random_seed(),
        };
        let next = next.with_random_seed(seed);

        if let Err(err) = self.settings.store(&next).await {
            warn!(error = %err, "failed to persist playback settings");
        }

        let reshuffled = next.order() == PlayOrder::Random && seed != current.random_seed();
        let rebuilt = if list_changed || reshuffled {
            Some(self.rebuild(&next).await)
        } else {
            None
        };

        debug!(
            list_type = next.list_type(),
            order = %next.order(),
            rebuilt = rebuilt.is_some(),
            "applying playback settings"
        );
        let effects = self.machine.apply_settings(next.clone(), rebuilt);
        self.execute(effects).await;
        Ok(next)
    }

    async fn rebuild(&mut self, settings: &PlaybackSettings) -> Rebuilt {
        let list = self.store.build_list(
            settings.list_type(),
            settings.order(),
            settings.random_seed(),
        );
        let key = self.store.list_key(settings.list_type(), settings.order());
        if let Err(err) = self.tracker.invalidate_if_list_changed(&key).await {
            warn!(list = %key, error = %err, "failed to record current list");
        }
        let progress = self.tracker.snapshot(&key);
        info!(list = %key, index = progress.index, "switched phrase list");
        Rebuilt {
            list,
            key,
            progress,
        }
    }

    async fn on_speech_done(&mut self, done: SpeechDone) {
        match done.result {
            Ok(mode) => debug!(?mode, text = %done.text, "speech finished"),
            Err(SpeechOutputError::Interrupted) => debug!(text = %done.text, "speech interrupted"),
            Err(err) => {
                warn!(error = %err, text = %done.text, "speech failed");
                self.emit(PlaybackEvent::SpeechFailed {
                    text: done.text,
                    message: err.to_string(),
                });
            }
        }
        // A failed leg still advances.
        if let Some(ticket) = done.ticket {
            let effects = self.machine.on_speech_finished(ticket);
            self.execute(effects).await;
        }
    }

    async fn on_recognition(&mut self, event: RecognitionEvent) {
        let RecognitionEvent {
            attempt,
            expected,
            outcome,
        } = event;
        debug!(attempt = attempt.0, ?outcome, "recognition outcome");

        let kind = match outcome {
            RecognitionOutcome::Matched => {
                self.emit(PlaybackEvent::Recognition(RecognitionFeedback::Matched {
                    expected,
                }));
                return;
            }
            RecognitionOutcome::Mismatch { heard } => {
                self.emit(PlaybackEvent::Recognition(RecognitionFeedback::Mismatch {
                    expected,
                    heard,
                }));
                return;
            }
            RecognitionOutcome::Cancelled => return,
            RecognitionOutcome::Error(kind) => kind,
        };

        if kind.is_fatal() {
            let effects = self.machine.disable_recognition();
            if effects.is_empty() {
                return;
            }
            warn!(%kind, "recognition disabled for this session");
            self.execute(effects).await;
            self.notice_clear = None;
            self.notify(kind, true);
        } else {
            self.notice_clear = Some(Box::pin(sleep(self.config.transient_notice)));
            self.notify(kind, false);
        }
    }

    fn notify(&self, kind: RecognitionErrorKind, persistent: bool) {
        self.emit(PlaybackEvent::Recognition(RecognitionFeedback::Notice(
            Notice {
                kind,
                message: kind.message().to_owned(),
                persistent,
            },
        )));
    }

    async fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Show(view) => self.emit(PlaybackEvent::PhraseShown(view)),
                Effect::Speak(cue) => self.speak(cue),
                Effect::StopSpeech => self.speech.stop().await,
                Effect::Listen(cue) => {
                    self.emit(PlaybackEvent::Recognition(RecognitionFeedback::Listening {
                        expected: cue.expected.clone(),
                        timeout: cue.timeout,
                    }));
                    self.recognition
                        .start_recognition(RecognitionRequest {
                            expected: cue.expected,
                            language: cue.language,
                            timeout: cue.timeout,
                        })
                        .await;
                }
                Effect::StopListening => self.recognition.stop_recognition().await,
                Effect::Schedule {
                    ticket,
                    kind,
                    delay,
                } => {
                    self.timer = Some(PendingTimer {
                        ticket,
                        sleep: Box::pin(sleep(delay)),
                    });
                    if kind == TimerKind::Advance {
                        self.emit(PlaybackEvent::PauseStarted { delay });
                    }
                }
                Effect::CancelTimer => self.timer = None,
                Effect::Progress { key, state, total } => {
                    if let Err(err) = self
                        .tracker
                        .set_progress(&key, state.current_repeat, state.index)
                        .await
                    {
                        warn!(list = %key, error = %err, "failed to persist progress");
                    }
                    self.emit(PlaybackEvent::ProgressChanged { key, state, total });
                }
                Effect::StateChanged(state) => {
                    debug!(?state, "player state changed");
                    self.emit(PlaybackEvent::StateChanged(state));
                }
            }
        }
    }

    fn speak(&self, cue: SpeechCue) {
        let speech = Arc::clone(&self.speech);
        let done = self.speech_done.clone();
        tokio::spawn(async move {
            let text = cue.text.clone();
            let result = speech
                .speak(SpeechRequest {
                    text: cue.text,
                    language: cue.language,
                    category: cue.category,
                    rate: cue.rate,
                    voice: cue.voice,
                })
                .await;
            let _ = done.send(SpeechDone {
                ticket: cue.ticket,
                text,
                result,
            });
        });
    }

    fn emit(&self, event: PlaybackEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

async fn fire(timer: &mut Option<PendingTimer>) -> Ticket {
    match timer {
        Some(pending_timer) => {
            pending_timer.sleep.as_mut().await;
            let ticket = pending_timer.ticket;
            *timer = None;
            ticket
        }
        None => pending().await,
    }
}

async fn elapsed(deadline: &mut Option<Pin<Box<Sleep>>>) {
    match deadline {
        Some(inner) => {
            inner.as_mut().await;
            *deadline = None;
        }
        None => pending().await,
    }
}

async fn next_recognition(
    receiver: &mut Option<broadcast::Receiver<RecognitionEvent>>,
) -> RecognitionEvent {
    loop {
        let Some(inner) = receiver.as_mut() else {
            return pending().await;
        };
        match inner.recv().await {
            Ok(event) => return event,
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "recognition events dropped"),
            Err(RecvError::Closed) => *receiver = None,
        }
    }
}
