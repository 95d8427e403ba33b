use std::collections::VecDeque;
use std::future::pending;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use phrase_core::model::Language;
use services::ports::AttemptId;
use services::recognition::DEFAULT_RESTART_DELAY;
use services::{
    NoRecognizer, RecognitionAdapter, RecognitionErrorKind, RecognitionEvent, RecognitionOutcome,
    RecognitionPort, RecognitionRequest, SpeechRecognizer,
};
use tokio::sync::broadcast;
use tokio::time::{Instant, sleep};

enum Script {
    Hear(&'static str),
    Fail(RecognitionErrorKind),
    Hang,
}

#[derive(Default)]
struct ScriptedRecognizer {
    script: Mutex<VecDeque<Script>>,
    calls: Mutex<Vec<Instant>>,
    aborts: AtomicUsize,
}

impl ScriptedRecognizer {
    fn new(script: impl IntoIterator<Item = Script>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        })
    }

    fn calls(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }

    fn aborts(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn recognize(&self, _language: Language) -> Result<String, RecognitionErrorKind> {
        self.calls.lock().unwrap().push(Instant::now());
        let step = self.script.lock().unwrap().pop_front();
        match step.unwrap_or(Script::Hang) {
            Script::Hear(text) => Ok(text.to_owned()),
            Script::Fail(kind) => Err(kind),
            Script::Hang => pending().await,
        }
    }

    async fn abort(&self) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
    }
}

fn request(expected: &str) -> RecognitionRequest {
    RecognitionRequest {
        expected: expected.to_owned(),
        language: Language::Target,
        timeout: Duration::from_secs(3),
    }
}

async fn next_event(events: &mut broadcast::Receiver<RecognitionEvent>) -> RecognitionEvent {
    events.recv().await.unwrap()
}

#[tokio::test(start_paused = true)]
async fn matching_transcript_ignores_case_and_punctuation() {
    let backend = ScriptedRecognizer::new([Script::Hear("hello!")]);
    let adapter = RecognitionAdapter::new(backend.clone());
    let mut events = adapter.subscribe();

    adapter.start_recognition(request("Hello")).await;
    let event = next_event(&mut events).await;

    assert_eq!(event.attempt, AttemptId(1));
    assert_eq!(event.expected, "Hello");
    assert_eq!(event.outcome, RecognitionOutcome::Matched);
    assert!(!adapter.is_listening());
}

#[tokio::test(start_paused = true)]
async fn different_transcript_is_a_mismatch() {
    let backend = ScriptedRecognizer::new([Script::Hear("goodbye")]);
    let adapter = RecognitionAdapter::new(backend);
    let mut events = adapter.subscribe();

    adapter.start_recognition(request("Hello")).await;
    assert_eq!(
        next_event(&mut events).await.outcome,
        RecognitionOutcome::Mismatch {
            heard: "goodbye".into()
        }
    );
}

#[tokio::test(start_paused = true)]
async fn backend_errors_are_passed_through() {
    let backend = ScriptedRecognizer::new([Script::Fail(RecognitionErrorKind::Network)]);
    let adapter = RecognitionAdapter::new(backend);
    let mut events = adapter.subscribe();

    adapter.start_recognition(request("Hello")).await;
    assert_eq!(
        next_event(&mut events).await.outcome,
        RecognitionOutcome::Error(RecognitionErrorKind::Network)
    );
}

#[tokio::test(start_paused = true)]
async fn same_phrase_while_listening_is_ignored() {
    let backend = ScriptedRecognizer::new([Script::Hang]);
    let adapter = RecognitionAdapter::new(backend.clone());

    adapter.start_recognition(request("Hello")).await;
    sleep(Duration::from_millis(10)).await;
    adapter.start_recognition(request("Hello")).await;
    sleep(Duration::from_millis(10)).await;

    assert_eq!(backend.calls().len(), 1);
    assert!(adapter.is_listening());
}

#[tokio::test(start_paused = true)]
async fn new_phrase_stops_previous_attempt_and_restarts_after_delay() {
    let backend = ScriptedRecognizer::new([Script::Hang, Script::Hear("bye")]);
    let adapter = RecognitionAdapter::new(backend.clone());
    let mut events = adapter.subscribe();

    adapter.start_recognition(request("Hello")).await;
    sleep(Duration::from_millis(10)).await;
    let switched_at = Instant::now();
    adapter.start_recognition(request("Bye")).await;

    let first = next_event(&mut events).await;
    assert_eq!(first.attempt, AttemptId(1));
    assert_eq!(first.outcome, RecognitionOutcome::Cancelled);

    let second = next_event(&mut events).await;
    assert_eq!(second.attempt, AttemptId(2));
    assert_eq!(second.expected, "Bye");
    assert_eq!(second.outcome, RecognitionOutcome::Matched);

    let calls = backend.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1] - switched_at >= DEFAULT_RESTART_DELAY);
    assert!(backend.aborts() >= 1);
}

#[tokio::test(start_paused = true)]
async fn silent_attempt_times_out_as_no_speech() {
    let backend = ScriptedRecognizer::new([Script::Hang]);
    let adapter = RecognitionAdapter::new(backend.clone());
    let mut events = adapter.subscribe();
    let started = Instant::now();

    adapter.start_recognition(request("Hello")).await;
    let event = next_event(&mut events).await;

    assert_eq!(
        event.outcome,
        RecognitionOutcome::Error(RecognitionErrorKind::NoSpeech)
    );
    assert!(started.elapsed() >= Duration::from_secs(3));
    assert_eq!(backend.aborts(), 1);
    assert!(!adapter.is_listening());
}

#[tokio::test(start_paused = true)]
async fn stop_aborts_the_live_attempt() {
    let backend = ScriptedRecognizer::new([Script::Hang]);
    let adapter = RecognitionAdapter::new(backend.clone());
    let mut events = adapter.subscribe();

    adapter.start_recognition(request("Hello")).await;
    sleep(Duration::from_millis(10)).await;
    adapter.stop_recognition().await;

    assert!(!adapter.is_listening());
    assert_eq!(
        next_event(&mut events).await.outcome,
        RecognitionOutcome::Cancelled
    );
    assert_eq!(backend.aborts(), 1);
}

#[tokio::test(start_paused = true)]
async fn backend_abort_is_reported_as_an_error() {
    let backend = ScriptedRecognizer::new([Script::Fail(RecognitionErrorKind::Aborted)]);
    let adapter = RecognitionAdapter::new(backend.clone());
    let mut events = adapter.subscribe();

    adapter.start_recognition(request("Hello")).await;
    assert_eq!(
        next_event(&mut events).await.outcome,
        RecognitionOutcome::Error(RecognitionErrorKind::Aborted)
    );
    assert_eq!(backend.aborts(), 0);
}

#[tokio::test(start_paused = true)]
async fn missing_microphone_is_fatal() {
    let adapter = RecognitionAdapter::new(Arc::new(NoRecognizer));
    let mut events = adapter.subscribe();

    adapter.start_recognition(request("Hello")).await;
    let RecognitionOutcome::Error(kind) = next_event(&mut events).await.outcome else {
        panic!("expected an error outcome");
    };
    assert_eq!(kind, RecognitionErrorKind::NoHardware);
    assert!(kind.is_fatal());
}
