use std::time::Duration;

use phrase_core::TimingProfile;
use phrase_core::playback::DEFAULT_NAV_DEBOUNCE;

use crate::recognition::DEFAULT_RESTART_DELAY;

/// Timing knobs of the playback engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub timing: TimingProfile,
    /// Coalescing window for manual next/prev while playing.
    pub nav_debounce: Duration,
    /// Used by `RecognitionAdapter` when it is built from this config.
    pub recognition_restart_delay: Duration,
    /// How long a transient recognition notice stays up.
    pub transient_notice: Duration,
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timing: TimingProfile::default(),
            nav_debounce: DEFAULT_NAV_DEBOUNCE,
            recognition_restart_delay: DEFAULT_RESTART_DELAY,
            transient_notice: Duration::from_secs(5),
            event_capacity: 256,
        }
    }
}
