use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::ports::{SpeechMode, SpeechOutputError, SpeechOutputPort, SpeechRequest};

/// Plays pre-recorded audio when there is some, synthesizes otherwise.
#[derive(Clone)]
pub struct FallbackSpeechOutput {
    audio: Arc<dyn SpeechOutputPort>,
    synthesis: Arc<dyn SpeechOutputPort>,
}

impl FallbackSpeechOutput {
    #[must_use]
    pub fn new(audio: Arc<dyn SpeechOutputPort>, synthesis: Arc<dyn SpeechOutputPort>) -> Self {
        Self { audio, synthesis }
    }
}

#[async_trait]
impl SpeechOutputPort for FallbackSpeechOutput {
    async fn speak(&self, request: SpeechRequest) -> Result<SpeechMode, SpeechOutputError> {
        match self.audio.speak(request.clone()).await {
            Ok(_) => Ok(SpeechMode::Audio),
            Err(SpeechOutputError::Interrupted) => Err(SpeechOutputError::Interrupted),
            Err(err) => {
                debug!(error = %err, text = %request.text, "audio failed, falling back to synthesis");
                self.synthesis
                    .speak(request)
                    .await
                    .map(|_| SpeechMode::Synthesis)
            }
        }
    }

    async fn stop(&self) {
        self.audio.stop().await;
        self.synthesis.stop().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phrase_core::model::{Language, VoiceGender};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        result: Result<(), SpeechOutputError>,
        calls: Mutex<Vec<String>>,
        stops: AtomicUsize,
    }

    impl Scripted {
        fn new(result: Result<(), SpeechOutputError>) -> Arc<Self> {
            Arc::new(Self {
                result,
                calls: Mutex::new(Vec::new()),
                stops: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SpeechOutputPort for Scripted {
        async fn speak(&self, request: SpeechRequest) -> Result<SpeechMode, SpeechOutputError> {
            self.calls.lock().unwrap().push(request.text);
            self.result.clone().map(|()| SpeechMode::Synthesis)
        }

        async fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn request() -> SpeechRequest {
        SpeechRequest {
            text: "Hello".into(),
            language: Language::Target,
            category: "greetings".into(),
            rate: 1.0,
            voice: VoiceGender::Male,
        }
    }

    #[tokio::test]
    async fn prefers_recorded_audio() {
        let audio = Scripted::new(Ok(()));
        let synth = Scripted::new(Ok(()));
        let output = FallbackSpeechOutput::new(audio.clone(), synth.clone());
        assert_eq!(output.speak(request()).await, Ok(SpeechMode::Audio));
        assert!(synth.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn falls_back_to_synthesis() {
        let audio = Scripted::new(Err(SpeechOutputError::Unavailable("no file".into())));
        let synth = Scripted::new(Ok(()));
        let output = FallbackSpeechOutput::new(audio, synth.clone());
        assert_eq!(output.speak(request()).await, Ok(SpeechMode::Synthesis));
        assert_eq!(*synth.calls.lock().unwrap(), ["Hello"]);
    }

    #[tokio::test]
    async fn interruption_is_not_retried() {
        let audio = Scripted::new(Err(SpeechOutputError::Interrupted));
        let synth = Scripted::new(Ok(()));
        let output = FallbackSpeechOutput::new(audio, synth.clone());
        assert_eq!(
            output.speak(request()).await,
            Err(SpeechOutputError::Interrupted)
        );
        assert!(synth.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stop_reaches_both_outputs() {
        let audio = Scripted::new(Ok(()));
        let synth = Scripted::new(Ok(()));
        let output = FallbackSpeechOutput::new(audio.clone(), synth.clone());
        output.stop().await;
        assert_eq!(audio.stops.load(Ordering::SeqCst), 1);
        assert_eq!(synth.stops.load(Ordering::SeqCst), 1);
    }
}
