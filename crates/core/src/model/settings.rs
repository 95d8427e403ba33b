use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::catalog::ALL_LISTS;
use crate::model::phrase::Language;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("speed must be between 0.5 and 2.0")]
    InvalidSpeed,

    #[error("pause between phrases must be between 0 and 30 seconds")]
    InvalidPauseBetweenPhrases,

    #[error("pause between languages must be between 0 and 30 seconds")]
    InvalidPauseBetweenLanguages,

    #[error("repeat length must be > 0")]
    InvalidRepeatLength,

    #[error("list type cannot be empty")]
    EmptyListType,

    #[error("unknown {field} value: {raw}")]
    UnknownValue { field: &'static str, raw: String },
}

//
// ─── ENUMS ─────────────────────────────────────────────────────────────────────
//

/// Playback direction.
///
/// Single directions show one language and speak the other. The `*Both`
/// modes speak both languages in turn, one leg each, before moving on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackDirection {
    NativeTarget,
    TargetNative,
    NativeTargetBoth,
    TargetNativeBoth,
}

impl PlaybackDirection {
    #[must_use]
    pub fn is_both(self) -> bool {
        matches!(self, Self::NativeTargetBoth | Self::TargetNativeBoth)
    }

    /// Languages `(shown, spoken)` for a leg.
    ///
    /// `first_leg` is ignored for single directions.
    #[must_use]
    pub fn leg_languages(self, first_leg: bool) -> (Language, Language) {
        match self {
            Self::NativeTarget => (Language::Native, Language::Target),
            Self::TargetNative => (Language::Target, Language::Native),
            Self::NativeTargetBoth | Self::TargetNativeBoth => {
                let first = if self == Self::TargetNativeBoth {
                    Language::Target
                } else {
                    Language::Native
                };
                let lang = if first_leg { first } else { first.other() };
                (lang, lang)
            }
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NativeTarget => "native-target",
            Self::TargetNative => "target-native",
            Self::NativeTargetBoth => "native-target-both",
            Self::TargetNativeBoth => "target-native-both",
        }
    }
}

impl FromStr for PlaybackDirection {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "native-target" => Ok(Self::NativeTarget),
            "target-native" => Ok(Self::TargetNative),
            "native-target-both" => Ok(Self::NativeTargetBoth),
            "target-native-both" => Ok(Self::TargetNativeBoth),
            other => Err(SettingsError::UnknownValue {
                field: "direction",
                raw: other.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlayOrder {
    Sequential,
    Random,
}

impl PlayOrder {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Random => "random",
        }
    }
}

impl fmt::Display for PlayOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayOrder {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequential" => Ok(Self::Sequential),
            "random" => Ok(Self::Random),
            other => Err(SettingsError::UnknownValue {
                field: "order",
                raw: other.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceGender {
    Male,
    Female,
}

impl VoiceGender {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl FromStr for VoiceGender {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            other => Err(SettingsError::UnknownValue {
                field: "voice",
                raw: other.to_owned(),
            }),
        }
    }
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Unvalidated playback settings, e.g. as edited in a settings form.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSettingsDraft {
    pub speed: f32,
    pub pause_between_phrases: f32,
    pub pause_between_languages: f32,
    pub direction: PlaybackDirection,
    pub order: PlayOrder,
    pub repeat_length: u32,
    pub repeat_count: u32,
    pub voice: VoiceGender,
    pub recognize: bool,
    pub list_type: String,
    pub random_seed: Option<u64>,
}

impl Default for PlaybackSettingsDraft {
    fn default() -> Self {
        Self {
            speed: 1.0,
            pause_between_phrases: 2.0,
            pause_between_languages: 2.0,
            direction: PlaybackDirection::NativeTargetBoth,
            order: PlayOrder::Sequential,
            repeat_length: 5,
            repeat_count: 0,
            voice: VoiceGender::Male,
            recognize: false,
            list_type: ALL_LISTS.to_owned(),
            random_seed: None,
        }
    }
}

impl PlaybackSettingsDraft {
    /// Validate and normalize the draft.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` for out-of-range numbers or an empty list type.
    pub fn validate(self) -> Result<PlaybackSettings, SettingsError> {
        if !self.speed.is_finite() || !(0.5..=2.0).contains(&self.speed) {
            return Err(SettingsError::InvalidSpeed);
        }
        if !valid_pause(self.pause_between_phrases) {
            return Err(SettingsError::InvalidPauseBetweenPhrases);
        }
        if !valid_pause(self.pause_between_languages) {
            return Err(SettingsError::InvalidPauseBetweenLanguages);
        }
        if self.repeat_length == 0 {
            return Err(SettingsError::InvalidRepeatLength);
        }
        let list_type = self.list_type.trim().to_owned();
        if list_type.is_empty() {
            return Err(SettingsError::EmptyListType);
        }

        Ok(PlaybackSettings {
            speed: self.speed,
            pause_between_phrases: self.pause_between_phrases,
            pause_between_languages: self.pause_between_languages,
            direction: self.direction,
            order: self.order,
            repeat_length: self.repeat_length,
            repeat_count: self.repeat_count,
            voice: self.voice,
            recognize: self.recognize,
            list_type,
            random_seed: self.random_seed,
        })
    }
}

fn valid_pause(secs: f32) -> bool {
    secs.is_finite() && (0.0..=30.0).contains(&secs)
}

/// Validated playback settings. Persisted as a whole on every change.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSettings {
    speed: f32,
    pause_between_phrases: f32,
    pause_between_languages: f32,
    direction: PlaybackDirection,
    order: PlayOrder,
    repeat_length: u32,
    repeat_count: u32,
    voice: VoiceGender,
    recognize: bool,
    list_type: String,
    random_seed: Option<u64>,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        let draft = PlaybackSettingsDraft::default();
        Self {
            speed: draft.speed,
            pause_between_phrases: draft.pause_between_phrases,
            pause_between_languages: draft.pause_between_languages,
            direction: draft.direction,
            order: draft.order,
            repeat_length: draft.repeat_length,
            repeat_count: draft.repeat_count,
            voice: draft.voice,
            recognize: draft.recognize,
            list_type: draft.list_type,
            random_seed: draft.random_seed,
        }
    }
}

impl PlaybackSettings {
    /// Shorthand for [`PlaybackSettingsDraft::validate`].
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the draft is out of range.
    pub fn new(draft: PlaybackSettingsDraft) -> Result<Self, SettingsError> {
        draft.validate()
    }

    /// Returns an editable copy of these settings.
    #[must_use]
    pub fn to_draft(&self) -> PlaybackSettingsDraft {
        PlaybackSettingsDraft {
            speed: self.speed,
            pause_between_phrases: self.pause_between_phrases,
            pause_between_languages: self.pause_between_languages,
            direction: self.direction,
            order: self.order,
            repeat_length: self.repeat_length,
            repeat_count: self.repeat_count,
            voice: self.voice,
            recognize: self.recognize,
            list_type: self.list_type.clone(),
            random_seed: self.random_seed,
        }
    }

    #[must_use]
    pub fn with_random_seed(mut self, seed: Option<u64>) -> Self {
        self.random_seed = seed;
        self
    }

    /// True when switching from `self` to `other` changes which phrases are
    /// played or their order.
    #[must_use]
    pub fn list_differs(&self, other: &PlaybackSettings) -> bool {
        self.list_type != other.list_type || self.order != other.order
    }

    // Accessors
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    #[must_use]
    pub fn pause_between_phrases(&self) -> f32 {
        self.pause_between_phrases
    }

    #[must_use]
    pub fn pause_between_languages(&self) -> f32 {
        self.pause_between_languages
    }

    #[must_use]
    pub fn direction(&self) -> PlaybackDirection {
        self.direction
    }

    #[must_use]
    pub fn order(&self) -> PlayOrder {
        self.order
    }

    #[must_use]
    pub fn repeat_length(&self) -> u32 {
        self.repeat_length
    }

    #[must_use]
    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    #[must_use]
    pub fn voice(&self) -> VoiceGender {
        self.voice
    }

    /// Whether the user asked for speech recognition.
    #[must_use]
    pub fn recognize(&self) -> bool {
        self.recognize
    }

    #[must_use]
    pub fn list_type(&self) -> &str {
        &self.list_type
    }

    #[must_use]
    pub fn random_seed(&self) -> Option<u64> {
        self.random_seed
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_player_defaults() {
        let settings = PlaybackSettings::default();
        assert!((settings.speed() - 1.0).abs() < f32::EPSILON);
        assert!((settings.pause_between_phrases() - 2.0).abs() < f32::EPSILON);
        assert_eq!(settings.direction(), PlaybackDirection::NativeTargetBoth);
        assert_eq!(settings.order(), PlayOrder::Sequential);
        assert_eq!(settings.repeat_length(), 5);
        assert_eq!(settings.repeat_count(), 0);
        assert_eq!(settings.voice(), VoiceGender::Male);
        assert!(!settings.recognize());
        assert_eq!(settings.list_type(), "all");
        assert_eq!(settings.random_seed(), None);
        assert_eq!(settings.to_draft().validate().unwrap(), settings);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let draft = PlaybackSettingsDraft {
            speed: 2.5,
            ..PlaybackSettingsDraft::default()
        };
        assert_eq!(draft.validate().unwrap_err(), SettingsError::InvalidSpeed);

        let draft = PlaybackSettingsDraft {
            pause_between_phrases: -1.0,
            ..PlaybackSettingsDraft::default()
        };
        assert_eq!(
            draft.validate().unwrap_err(),
            SettingsError::InvalidPauseBetweenPhrases
        );

        let draft = PlaybackSettingsDraft {
            pause_between_languages: f32::NAN,
            ..PlaybackSettingsDraft::default()
        };
        assert_eq!(
            draft.validate().unwrap_err(),
            SettingsError::InvalidPauseBetweenLanguages
        );

        let draft = PlaybackSettingsDraft {
            repeat_length: 0,
            ..PlaybackSettingsDraft::default()
        };
        assert_eq!(
            draft.validate().unwrap_err(),
            SettingsError::InvalidRepeatLength
        );

        let draft = PlaybackSettingsDraft {
            list_type: "  ".into(),
            ..PlaybackSettingsDraft::default()
        };
        assert_eq!(draft.validate().unwrap_err(), SettingsError::EmptyListType);
    }

    #[test]
    fn leg_languages_follow_direction() {
        use Language::{Native, Target};

        assert_eq!(
            PlaybackDirection::NativeTarget.leg_languages(true),
            (Native, Target)
        );
        assert_eq!(
            PlaybackDirection::TargetNative.leg_languages(false),
            (Target, Native)
        );
        assert_eq!(
            PlaybackDirection::TargetNativeBoth.leg_languages(true),
            (Target, Target)
        );
        assert_eq!(
            PlaybackDirection::TargetNativeBoth.leg_languages(false),
            (Native, Native)
        );
        assert_eq!(
            PlaybackDirection::NativeTargetBoth.leg_languages(true),
            (Native, Native)
        );
    }

    #[test]
    fn enums_parse_their_storage_names() {
        for dir in [
            PlaybackDirection::NativeTarget,
            PlaybackDirection::TargetNative,
            PlaybackDirection::NativeTargetBoth,
            PlaybackDirection::TargetNativeBoth,
        ] {
            assert_eq!(dir.as_str().parse::<PlaybackDirection>().unwrap(), dir);
        }
        assert_eq!("random".parse::<PlayOrder>().unwrap(), PlayOrder::Random);
        assert_eq!("female".parse::<VoiceGender>().unwrap(), VoiceGender::Female);
        assert!("loud".parse::<VoiceGender>().is_err());
    }

    #[test]
    fn list_differs_on_type_or_order_only() {
        let base = PlaybackSettings::default();
        let faster = PlaybackSettingsDraft {
            speed: 1.5,
            ..base.to_draft()
        }
        .validate()
        .unwrap();
        assert!(!base.list_differs(&faster));

        let shuffled = PlaybackSettingsDraft {
            order: PlayOrder::Random,
            ..base.to_draft()
        }
        .validate()
        .unwrap();
        assert!(base.list_differs(&shuffled));
    }
}
