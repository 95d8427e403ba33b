use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use phrase_core::playback::{PhraseView, PlayerState};
use services::{
    PlaybackEvent, RecognitionFeedback, SpeechMode, SpeechOutputError, SpeechOutputPort,
    SpeechRequest,
};
use tokio::sync::{Notify, broadcast};
use tracing::{debug, warn};

/// Rough reading speed used to simulate how long speaking takes.
const CHAR_TIME: Duration = Duration::from_millis(60);

fn talk_time(request: &SpeechRequest) -> Duration {
    let chars = u32::try_from(request.text.chars().count()).unwrap_or(u32::MAX);
    CHAR_TIME
        .saturating_mul(chars)
        .div_f32(request.rate.max(0.1))
}

async fn wait_unless_stopped(talk: Duration, interrupt: &Notify) -> Result<(), SpeechOutputError> {
    tokio::select! {
        () = tokio::time::sleep(talk) => Ok(()),
        () = interrupt.notified() => Err(SpeechOutputError::Interrupted),
    }
}

/// Speech output for terminals: prints the text and waits as long as a voice
/// would need to say it.
#[derive(Default)]
pub struct ConsoleSpeech {
    interrupt: Notify,
}

#[async_trait]
impl SpeechOutputPort for ConsoleSpeech {
    async fn speak(&self, request: SpeechRequest) -> Result<SpeechMode, SpeechOutputError> {
        println!("  ({}) {}", request.language, request.text);
        let talk = talk_time(&request);
        debug!(?talk, voice = request.voice.as_str(), "console speech");
        wait_unless_stopped(talk, &self.interrupt).await?;
        Ok(SpeechMode::Synthesis)
    }

    async fn stop(&self) {
        self.interrupt.notify_waiters();
    }
}

/// Pre-recorded clips laid out as `<dir>/<category>/<words>.mp3`.
///
/// Phrases without a clip fail with `Unavailable` so a fallback can take over.
#[derive(Default)]
pub struct RecordedAudio {
    dir: Option<PathBuf>,
    interrupt: Notify,
}

impl RecordedAudio {
    #[must_use]
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self {
            dir,
            interrupt: Notify::new(),
        }
    }

    fn clip_path(&self, request: &SpeechRequest) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        let words: Vec<String> = request
            .text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(str::to_owned)
            .collect();
        if words.is_empty() {
            return None;
        }
        Some(dir.join(&request.category).join(format!("{}.mp3", words.join("_"))))
    }
}

#[async_trait]
impl SpeechOutputPort for RecordedAudio {
    async fn speak(&self, request: SpeechRequest) -> Result<SpeechMode, SpeechOutputError> {
        let Some(path) = self.clip_path(&request) else {
            return Err(SpeechOutputError::Unavailable("no audio directory".into()));
        };
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(SpeechOutputError::Unavailable(format!(
                "no clip at {}",
                path.display()
            )));
        }

        println!("  ({}) {} [{}]", request.language, request.text, path.display());
        wait_unless_stopped(talk_time(&request), &self.interrupt).await?;
        Ok(SpeechMode::Audio)
    }

    async fn stop(&self) {
        self.interrupt.notify_waiters();
    }
}

fn print_view(view: &PhraseView) {
    println!(
        "[{}/{}] {} | {}",
        view.index + 1,
        view.total,
        view.category,
        view.text
    );
    if let Some(context) = &view.context {
        println!("        {context}");
    }
}

/// Print playback events until the engine goes away.
pub async fn print_events(mut events: broadcast::Receiver<PlaybackEvent>) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "console fell behind playback events");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        match event {
            PlaybackEvent::PhraseShown(view) => print_view(&view),
            PlaybackEvent::StateChanged(state) => match state {
                PlayerState::Idle => {}
                PlayerState::Playing(_) => println!("> playing"),
                PlayerState::Paused(_) => println!("|| paused"),
                PlayerState::Stopped => println!("[] stopped"),
            },
            PlaybackEvent::ProgressChanged { key, state, total } => {
                debug!(list = %key, index = state.index, repeat = state.current_repeat, total, "progress");
            }
            PlaybackEvent::PauseStarted { delay } => debug!(?delay, "pause"),
            PlaybackEvent::Recognition(feedback) => match feedback {
                RecognitionFeedback::Listening { expected, .. } => {
                    println!("  listening for: {expected}");
                }
                RecognitionFeedback::Matched { .. } => println!("  correct!"),
                RecognitionFeedback::Mismatch { heard, .. } => println!("  heard: {heard}"),
                RecognitionFeedback::Notice(notice) => println!("  ! {}", notice.message),
                RecognitionFeedback::NoticeCleared => {}
            },
            PlaybackEvent::SpeechFailed { text, message } => {
                println!("  could not speak {text:?}: {message}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phrase_core::model::{Language, VoiceGender};
    use services::FallbackSpeechOutput;
    use std::sync::Arc;

    fn request(text: &str) -> SpeechRequest {
        SpeechRequest {
            text: text.into(),
            language: Language::Target,
            category: "greetings".into(),
            rate: 1.0,
            voice: VoiceGender::Male,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn speaking_takes_time_per_character() {
        let speech = ConsoleSpeech::default();
        let started = tokio::time::Instant::now();
        let mode = speech.speak(request("Hello")).await.unwrap();
        assert_eq!(mode, SpeechMode::Synthesis);
        assert_eq!(started.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_clip_falls_back_to_console_voice() {
        let speech = FallbackSpeechOutput::new(
            Arc::new(RecordedAudio::new(None)),
            Arc::new(ConsoleSpeech::default()),
        );
        assert_eq!(
            speech.speak(request("Hello")).await.unwrap(),
            SpeechMode::Synthesis
        );
    }

    #[tokio::test(start_paused = true)]
    async fn recorded_clip_is_played_when_present() {
        let dir = std::env::temp_dir().join(format!("phrase-audio-{}", std::process::id()));
        tokio::fs::create_dir_all(dir.join("greetings")).await.unwrap();
        tokio::fs::write(dir.join("greetings").join("hello_world.mp3"), b"")
            .await
            .unwrap();

        let audio = RecordedAudio::new(Some(dir.clone()));
        let mode = audio.speak(request("Hello, world!")).await;
        let missing = audio.speak(request("Goodbye")).await;
        let _ = tokio::fs::remove_dir_all(&dir).await;

        assert_eq!(mode, Ok(SpeechMode::Audio));
        assert!(matches!(missing, Err(SpeechOutputError::Unavailable(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_interrupts_speech() {
        let speech = Arc::new(ConsoleSpeech::default());
        let speaking = tokio::spawn({
            let speech = Arc::clone(&speech);
            async move { speech.speak(request("A rather long sentence")).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        speech.stop().await;
        assert_eq!(
            speaking.await.unwrap(),
            Err(SpeechOutputError::Interrupted)
        );
    }
}
