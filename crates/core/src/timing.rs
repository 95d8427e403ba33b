use std::time::Duration;

use crate::model::Language;

/// Per-character speaking time estimates used to size the gap after a leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingProfile {
    pub native_char_ms: f64,
    pub target_char_ms: f64,
    /// Shaved off the pause when nobody is listening for an answer.
    pub latency_trim_ms: f64,
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self {
            native_char_ms: 30.0,
            target_char_ms: 20.0,
            latency_trim_ms: 1000.0,
        }
    }
}

impl TimingProfile {
    #[must_use]
    pub fn char_ms(&self, language: Language) -> f64 {
        match language {
            Language::Native => self.native_char_ms,
            Language::Target => self.target_char_ms,
        }
    }

    /// Delay between the end of a leg and whatever comes next.
    ///
    /// `pause_ms + chars * char_ms / speed`, where the pause loses up to
    /// `latency_trim_ms` unless recognition is listening.
    #[must_use]
    pub fn advance_delay(
        &self,
        pause_secs: f32,
        spoken: &str,
        language: Language,
        speed: f32,
        listening: bool,
    ) -> Duration {
        let mut pause_ms = f64::from(pause_secs.max(0.0)) * 1000.0;
        if !listening {
            pause_ms = (pause_ms - self.latency_trim_ms).max(0.0);
        }
        let speed = f64::from(speed).max(f64::EPSILON);
        let chars = spoken.chars().count() as f64;
        let total = pause_ms + chars * self.char_ms(language) / speed;
        Duration::from_millis(total.round() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listening_keeps_full_pause() {
        let profile = TimingProfile::default();
        // 5 chars * 20 ms + 2000 ms
        let delay = profile.advance_delay(2.0, "Hello", Language::Target, 1.0, true);
        assert_eq!(delay, Duration::from_millis(2100));
    }

    #[test]
    fn trims_pause_when_not_listening() {
        let profile = TimingProfile::default();
        let delay = profile.advance_delay(2.0, "Hello", Language::Target, 1.0, false);
        assert_eq!(delay, Duration::from_millis(1100));

        // never below zero
        let delay = profile.advance_delay(0.5, "Hi", Language::Native, 1.0, false);
        assert_eq!(delay, Duration::from_millis(60));
    }

    #[test]
    fn speed_scales_reading_time_only() {
        let profile = TimingProfile::default();
        let delay = profile.advance_delay(1.0, "Привет", Language::Native, 2.0, true);
        // 6 chars * 30 / 2 + 1000
        assert_eq!(delay, Duration::from_millis(1090));
    }
}
