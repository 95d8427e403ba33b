use std::time::Duration;

use thiserror::Error;

use crate::model::{Language, ListKey, Phrase, PlaybackSettings, ProgressState};
use crate::playback::effect::{
    Effect, Leg, ListenCue, PhraseView, PlayerState, SpeechCue, Ticket, TimerKind,
};
use crate::playback::repeat::RepeatBlock;
use crate::text::speakable;
use crate::timing::TimingProfile;

/// Window in which rapid manual navigation collapses into one playback start.
pub const DEFAULT_NAV_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlaybackError {
    #[error("phrase list is empty")]
    EmptyList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    Playing,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    None,
    Speech { ticket: Ticket, language: Language },
    Timer { ticket: Ticket, kind: TimerKind },
}

/// A freshly built list to switch to, with the stored progress for its key.
#[derive(Debug, Clone)]
pub struct Rebuilt {
    pub list: Vec<Phrase>,
    pub key: ListKey,
    pub progress: ProgressState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub state: PlayerState,
    pub index: usize,
    pub total: usize,
    pub current_repeat: u32,
    pub miss_one: bool,
    pub recognition_available: bool,
    pub list_key: ListKey,
}

/// Synchronous playback state machine.
///
/// Every operation returns the effects the caller must carry out, in order.
/// The machine never touches a clock or an I/O device itself: timers and
/// speech completions come back in through [`on_timer`](Self::on_timer) and
/// [`on_speech_finished`](Self::on_speech_finished) carrying the ticket they
/// were issued with.
#[derive(Debug, Clone)]
pub struct PlaybackMachine {
    settings: PlaybackSettings,
    timing: TimingProfile,
    nav_debounce: Duration,
    list: Vec<Phrase>,
    key: ListKey,
    cursor: ProgressState,
    showing_first: bool,
    miss_one: bool,
    mode: Mode,
    recognition_available: bool,
    generation: u64,
    pending: Pending,
}

impl PlaybackMachine {
    #[must_use]
    pub fn new(
        settings: PlaybackSettings,
        list: Vec<Phrase>,
        key: ListKey,
        progress: ProgressState,
    ) -> Self {
        let cursor = progress.clamped(list.len());
        Self {
            settings,
            timing: TimingProfile::default(),
            nav_debounce: DEFAULT_NAV_DEBOUNCE,
            list,
            key,
            cursor,
            showing_first: true,
            miss_one: false,
            mode: Mode::Idle,
            recognition_available: true,
            generation: 0,
            pending: Pending::None,
        }
    }

    #[must_use]
    pub fn with_timing(mut self, timing: TimingProfile) -> Self {
        self.timing = timing;
        self
    }

    #[must_use]
    pub fn with_nav_debounce(mut self, debounce: Duration) -> Self {
        self.nav_debounce = debounce;
        self
    }

    // ─── Accessors ─────────────────────────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    #[must_use]
    pub fn list_key(&self) -> &ListKey {
        &self.key
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    #[must_use]
    pub fn current_phrase(&self) -> Option<&Phrase> {
        self.list.get(self.cursor.index)
    }

    #[must_use]
    pub fn state(&self) -> PlayerState {
        let leg = self.leg();
        match self.mode {
            Mode::Idle => PlayerState::Idle,
            Mode::Playing => PlayerState::Playing(leg),
            Mode::Paused => PlayerState::Paused(leg),
            Mode::Stopped => PlayerState::Stopped,
        }
    }

    /// Recognition is wanted by the user and has not been disabled by a
    /// fatal error.
    #[must_use]
    pub fn recognition_active(&self) -> bool {
        self.settings.recognize() && self.recognition_available
    }

    /// What the display should show for the current phrase and leg.
    #[must_use]
    pub fn current_view(&self) -> Option<PhraseView> {
        let (shown, _) = self.settings.direction().leg_languages(self.showing_first);
        self.view(shown)
    }

    #[must_use]
    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state: self.state(),
            index: self.cursor.index,
            total: self.list.len(),
            current_repeat: self.cursor.current_repeat,
            miss_one: self.miss_one,
            recognition_available: self.recognition_available,
            list_key: self.key.clone(),
        }
    }

    // ─── Transport ─────────────────────────────────────────────────────────────

    /// Starts playback from the stored cursor, or resumes when paused.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError::EmptyList` without changing state when there
    /// is nothing to play.
    pub fn start(&mut self) -> Result<Vec<Effect>, PlaybackError> {
        if self.list.is_empty() {
            return Err(PlaybackError::EmptyList);
        }
        match self.mode {
            Mode::Playing => Ok(Vec::new()),
            Mode::Paused => Ok(self.resume()),
            Mode::Idle | Mode::Stopped => {
                let before = self.state();
                let mut effects = Vec::new();
                self.mode = Mode::Playing;
                self.showing_first = true;
                self.play_current(&mut effects);
                Ok(self.finish(before, effects))
            }
        }
    }

    /// Cancels the pending timer and recognition. Speech in flight is left to
    /// finish; its completion will be ignored.
    pub fn pause(&mut self) -> Vec<Effect> {
        if self.mode != Mode::Playing {
            return Vec::new();
        }
        let before = self.state();
        let mut effects = Vec::new();
        self.mode = Mode::Paused;
        self.cancel_pending(&mut effects);
        effects.push(Effect::StopListening);
        self.finish(before, effects)
    }

    /// Replays the leg that was interrupted by `pause`.
    pub fn resume(&mut self) -> Vec<Effect> {
        if self.mode != Mode::Paused {
            return Vec::new();
        }
        let before = self.state();
        let mut effects = vec![Effect::StopSpeech];
        self.mode = Mode::Playing;
        self.play_current(&mut effects);
        self.finish(before, effects)
    }

    /// Play/pause button semantics.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError::EmptyList` when starting an empty list.
    pub fn toggle(&mut self) -> Result<Vec<Effect>, PlaybackError> {
        match self.mode {
            Mode::Playing => Ok(self.pause()),
            Mode::Paused => Ok(self.resume()),
            Mode::Idle | Mode::Stopped => self.start(),
        }
    }

    /// Stops everything. The cursor is kept. Stopping twice is a no-op.
    pub fn stop(&mut self) -> Vec<Effect> {
        if matches!(self.mode, Mode::Idle | Mode::Stopped) {
            return Vec::new();
        }
        let before = self.state();
        let mut effects = Vec::new();
        self.mode = Mode::Stopped;
        self.cancel_pending(&mut effects);
        effects.push(Effect::StopSpeech);
        effects.push(Effect::StopListening);
        self.finish(before, effects)
    }

    pub fn next(&mut self) -> Vec<Effect> {
        let index = self.cursor.index.saturating_add(1);
        self.navigate(index)
    }

    pub fn prev(&mut self) -> Vec<Effect> {
        let index = self.cursor.index.saturating_sub(1);
        self.navigate(index)
    }

    /// Speaks the current phrase in `language` without touching the schedule.
    pub fn speak_current(&self, language: Language) -> Vec<Effect> {
        self.cue(None, language)
            .map(|cue| vec![Effect::Speak(cue)])
            .unwrap_or_default()
    }

    // ─── Completions ───────────────────────────────────────────────────────────

    /// The speech request carrying `ticket` finished (or failed).
    pub fn on_speech_finished(&mut self, ticket: Ticket) -> Vec<Effect> {
        let Pending::Speech {
            ticket: pending,
            language,
        } = self.pending
        else {
            return Vec::new();
        };
        if pending != ticket || self.mode != Mode::Playing {
            return Vec::new();
        }
        let Some(phrase) = self.current_phrase() else {
            return Vec::new();
        };

        let both = self.settings.direction().is_both();
        let spoken = speakable(phrase.text(language));
        let expected = speakable(phrase.target());
        let listening = self.recognition_active() && (!both || language == Language::Target);
        let pause = if both && self.showing_first {
            self.settings.pause_between_languages()
        } else {
            self.settings.pause_between_phrases()
        };
        let delay =
            self.timing
                .advance_delay(pause, &spoken, language, self.settings.speed(), listening);

        let mut effects = Vec::new();
        if listening {
            effects.push(Effect::Listen(ListenCue {
                expected,
                language: Language::Target,
                timeout: delay,
            }));
        }
        self.schedule(TimerKind::Advance, delay, &mut effects);
        effects
    }

    /// The timer carrying `ticket` fired.
    pub fn on_timer(&mut self, ticket: Ticket) -> Vec<Effect> {
        let Pending::Timer {
            ticket: pending,
            kind,
        } = self.pending
        else {
            return Vec::new();
        };
        if pending != ticket || self.mode != Mode::Playing {
            return Vec::new();
        }
        self.pending = Pending::None;

        let before = self.state();
        let mut effects = Vec::new();
        match kind {
            TimerKind::Debounce => {}
            TimerKind::Advance if self.settings.direction().is_both() && self.showing_first => {
                self.showing_first = false;
            }
            TimerKind::Advance => {
                let block = RepeatBlock::new(
                    self.settings.repeat_length(),
                    self.settings.repeat_count(),
                );
                let crossing = block.crosses_boundary(self.cursor, self.list.len());
                self.cursor = block.advance(self.cursor, self.list.len(), self.miss_one);
                // The flag covers navigation up to the next block boundary.
                if crossing {
                    self.miss_one = false;
                }
                self.showing_first = true;
                effects.push(self.progress_effect());
            }
        }
        self.play_current(&mut effects);
        self.finish(before, effects)
    }

    // ─── Settings ──────────────────────────────────────────────────────────────

    /// Switches to new settings, and to a new list when one is given.
    ///
    /// A running leg is restarted from scratch so the new settings apply at
    /// once. Switching to an empty list while playing stops playback.
    pub fn apply_settings(
        &mut self,
        settings: PlaybackSettings,
        rebuilt: Option<Rebuilt>,
    ) -> Vec<Effect> {
        let before = self.state();
        let old = std::mem::replace(&mut self.settings, settings);
        let mut effects = Vec::new();

        if let Some(rebuilt) = rebuilt {
            self.list = rebuilt.list;
            self.key = rebuilt.key;
            self.cursor = rebuilt.progress.clamped(self.list.len());
            self.miss_one = false;
            self.showing_first = true;
            effects.push(self.progress_effect());
        }
        if old.direction() != self.settings.direction() {
            self.showing_first = true;
        }

        let mut listening_stopped = false;
        if old.recognize() && !self.settings.recognize() {
            effects.push(Effect::StopListening);
            listening_stopped = true;
        }

        match self.mode {
            Mode::Playing | Mode::Paused if self.list.is_empty() => {
                self.mode = Mode::Stopped;
                self.cancel_pending(&mut effects);
                effects.push(Effect::StopSpeech);
                if !listening_stopped {
                    effects.push(Effect::StopListening);
                }
            }
            Mode::Playing => {
                self.cancel_pending(&mut effects);
                effects.push(Effect::StopSpeech);
                if !listening_stopped {
                    effects.push(Effect::StopListening);
                }
                self.play_current(&mut effects);
            }
            _ => {
                if let Some(view) = self.current_view() {
                    effects.push(Effect::Show(view));
                }
            }
        }
        self.finish(before, effects)
    }

    /// Turns recognition off for the rest of the session.
    pub fn disable_recognition(&mut self) -> Vec<Effect> {
        if !self.recognition_available {
            return Vec::new();
        }
        self.recognition_available = false;
        vec![Effect::StopListening]
    }

    // ─── Internals ─────────────────────────────────────────────────────────────

    fn leg(&self) -> Leg {
        if self.showing_first {
            Leg::First
        } else {
            Leg::Second
        }
    }

    fn issue(&mut self) -> Ticket {
        self.generation += 1;
        Ticket::from_generation(self.generation)
    }

    fn schedule(&mut self, kind: TimerKind, delay: Duration, effects: &mut Vec<Effect>) {
        let ticket = self.issue();
        self.pending = Pending::Timer { ticket, kind };
        effects.push(Effect::Schedule {
            ticket,
            kind,
            delay,
        });
    }

    fn cancel_pending(&mut self, effects: &mut Vec<Effect>) {
        if matches!(self.pending, Pending::Timer { .. }) {
            effects.push(Effect::CancelTimer);
        }
        self.pending = Pending::None;
    }

    fn navigate(&mut self, index: usize) -> Vec<Effect> {
        if self.list.is_empty() {
            return Vec::new();
        }
        let before = self.state();
        let mut effects = Vec::new();
        self.cancel_pending(&mut effects);

        self.cursor.index = index.min(self.list.len() - 1);
        self.showing_first = true;
        self.miss_one = true;
        effects.push(self.progress_effect());

        if let Some(view) = self.current_view() {
            effects.push(Effect::Show(view));
        }
        if self.mode == Mode::Playing {
            effects.push(Effect::StopSpeech);
            effects.push(Effect::StopListening);
            self.schedule(TimerKind::Debounce, self.nav_debounce, &mut effects);
        }
        self.finish(before, effects)
    }

    fn play_current(&mut self, effects: &mut Vec<Effect>) {
        if self.list.is_empty() {
            return;
        }
        if self.cursor.index >= self.list.len() {
            self.cursor = ProgressState::default();
        }
        if !self.settings.direction().is_both() {
            self.showing_first = true;
        }

        let (shown, spoken) = self.settings.direction().leg_languages(self.showing_first);
        if let Some(view) = self.view(shown) {
            effects.push(Effect::Show(view));
        }
        let ticket = self.issue();
        if let Some(cue) = self.cue(Some(ticket), spoken) {
            effects.push(Effect::Speak(cue));
        }
        self.pending = Pending::Speech {
            ticket,
            language: spoken,
        };
    }

    fn view(&self, shown: Language) -> Option<PhraseView> {
        let phrase = self.current_phrase()?;
        Some(PhraseView {
            index: self.cursor.index,
            total: self.list.len(),
            shown,
            text: phrase.text(shown).to_owned(),
            hint: phrase.text(shown.other()).to_owned(),
            category: phrase.category().to_owned(),
            context: phrase.context().map(str::to_owned),
            leg: self.leg(),
        })
    }

    fn cue(&self, ticket: Option<Ticket>, language: Language) -> Option<SpeechCue> {
        let phrase = self.current_phrase()?;
        Some(SpeechCue {
            ticket,
            text: speakable(phrase.text(language)),
            language,
            category: phrase.category().to_owned(),
            rate: self.settings.speed(),
            voice: self.settings.voice(),
        })
    }

    fn progress_effect(&self) -> Effect {
        Effect::Progress {
            key: self.key.clone(),
            state: self.cursor,
            total: self.list.len(),
        }
    }

    fn finish(&self, before: PlayerState, mut effects: Vec<Effect>) -> Vec<Effect> {
        let after = self.state();
        if after != before {
            effects.push(Effect::StateChanged(after));
        }
        effects
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
