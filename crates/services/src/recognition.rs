use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use phrase_core::model::Language;
use phrase_core::text;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::ports::{
    AttemptId, RecognitionErrorKind, RecognitionEvent, RecognitionOutcome, RecognitionPort,
    RecognitionRequest, SpeechRecognizer,
};

/// Pause between stopping one attempt and starting the next.
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_millis(100);

const EVENT_CAPACITY: usize = 32;

struct LiveAttempt {
    id: AttemptId,
    expected: String,
    cancel: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct AdapterState {
    next_attempt: u64,
    live: Option<LiveAttempt>,
}

struct Inner {
    backend: Arc<dyn SpeechRecognizer>,
    events: broadcast::Sender<RecognitionEvent>,
    restart_delay: Duration,
    state: Mutex<AdapterState>,
}

/// Turns a single-shot recognizer into a [`RecognitionPort`].
///
/// At most one attempt is live. Asking again for the same phrase while it is
/// live does nothing; asking for a different phrase stops the live attempt,
/// waits for the backend to settle, then starts over after `restart_delay`.
/// Every attempt publishes exactly one [`RecognitionEvent`].
#[derive(Clone)]
pub struct RecognitionAdapter {
    inner: Arc<Inner>,
}

impl RecognitionAdapter {
    #[must_use]
    pub fn new(backend: Arc<dyn SpeechRecognizer>) -> Self {
        Self::with_restart_delay(backend, DEFAULT_RESTART_DELAY)
    }

    #[must_use]
    pub fn with_restart_delay(backend: Arc<dyn SpeechRecognizer>, restart_delay: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                backend,
                events,
                restart_delay,
                state: Mutex::new(AdapterState::default()),
            }),
        }
    }

    /// True while an attempt is waiting to start or listening.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.inner.lock().live.is_some()
    }
}

impl Inner {
    fn lock(&self) -> std::sync::MutexGuard<'_, AdapterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run_attempt(
        self: Arc<Self>,
        id: AttemptId,
        request: RecognitionRequest,
        previous: Option<LiveAttempt>,
        mut cancel: oneshot::Receiver<()>,
    ) {
        let expected = request.expected.clone();
        let outcome = tokio::select! {
            biased;
            _ = &mut cancel => {
                self.backend.abort().await;
                RecognitionOutcome::Cancelled
            }
            outcome = self.listen(request, previous) => outcome,
        };

        debug!(attempt = id.0, ?outcome, "recognition attempt finished");
        {
            let mut state = self.lock();
            if state.live.as_ref().is_some_and(|live| live.id == id) {
                state.live = None;
            }
        }
        let _ = self.events.send(RecognitionEvent {
            attempt: id,
            expected,
            outcome,
        });
    }

    async fn listen(
        &self,
        request: RecognitionRequest,
        previous: Option<LiveAttempt>,
    ) -> RecognitionOutcome {
        if let Some(previous) = previous {
            let _ = previous.cancel.send(());
            let _ = previous.task.await;
            tokio::time::sleep(self.restart_delay).await;
        }

        let heard =
            tokio::time::timeout(request.timeout, self.backend.recognize(request.language)).await;
        match heard {
            Err(_) => {
                self.backend.abort().await;
                RecognitionOutcome::Error(RecognitionErrorKind::NoSpeech)
            }
            Ok(Err(kind)) => RecognitionOutcome::Error(kind),
            Ok(Ok(heard)) if text::matches(&heard, &request.expected) => RecognitionOutcome::Matched,
            Ok(Ok(heard)) => RecognitionOutcome::Mismatch { heard },
        }
    }
}

#[async_trait]
impl RecognitionPort for RecognitionAdapter {
    async fn start_recognition(&self, request: RecognitionRequest) {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let mut state = self.inner.lock();

        if state
            .live
            .as_ref()
            .is_some_and(|live| live.expected == request.expected)
        {
            return;
        }

        state.next_attempt += 1;
        let id = AttemptId(state.next_attempt);
        let previous = state.live.take();
        let expected = request.expected.clone();
        debug!(attempt = id.0, %expected, language = %request.language, "starting recognition");

        let task = tokio::spawn(Arc::clone(&self.inner).run_attempt(id, request, previous, cancel_rx));
        state.live = Some(LiveAttempt {
            id,
            expected,
            cancel: cancel_tx,
            task,
        });
    }

    async fn stop_recognition(&self) {
        let live = self.inner.lock().live.take();
        if let Some(live) = live {
            let _ = live.cancel.send(());
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<RecognitionEvent> {
        self.inner.events.subscribe()
    }
}

/// Backend for machines without a microphone: every attempt fails with
/// `NoHardware`, which switches recognition off for the session.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRecognizer;

#[async_trait]
impl SpeechRecognizer for NoRecognizer {
    async fn recognize(&self, _language: Language) -> Result<String, RecognitionErrorKind> {
        Err(RecognitionErrorKind::NoHardware)
    }

    async fn abort(&self) {}
}
