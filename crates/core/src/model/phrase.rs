use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Reasons a raw phrase entry is rejected at load time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PhraseError {
    #[error("phrase has neither native nor target text")]
    Empty,

    #[error("phrase has no native text (target: {target:?})")]
    MissingNative { target: String },

    #[error("phrase has no target text (native: {native:?})")]
    MissingTarget { native: String },
}

//
// ─── LANGUAGE ──────────────────────────────────────────────────────────────────
//

/// Which side of a phrase pair is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// The learner's own language.
    Native,
    /// The language being learned.
    Target,
}

impl Language {
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Language::Native => Language::Target,
            Language::Target => Language::Native,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Native => "native",
            Language::Target => "target",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Translation direction a phrase was authored for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhraseDirection {
    #[default]
    TargetNative,
    NativeTarget,
}

impl PhraseDirection {
    /// Lenient parse used for raw data; unknown values fall back to the default.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim() {
            "native-target" => Self::NativeTarget,
            _ => Self::TargetNative,
        }
    }
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Difficulty level in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Builds a difficulty, clamping out-of-range levels into `1..=5`.
    #[must_use]
    pub fn clamped(level: i64) -> Self {
        let level = level.clamp(i64::from(Self::MIN), i64::from(Self::MAX));
        Self(u8::try_from(level).unwrap_or(Self::MIN))
    }

    #[must_use]
    pub fn level(self) -> u8 {
        self.0
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

//
// ─── RAW ENTRY ─────────────────────────────────────────────────────────────────
//

/// `difficulty_level` arrives either as a number or as a numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelValue {
    Number(i64),
    Text(String),
}

impl LevelValue {
    fn to_difficulty(&self) -> Difficulty {
        match self {
            LevelValue::Number(n) => Difficulty::clamped(*n),
            LevelValue::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(Difficulty::clamped)
                .unwrap_or_default(),
        }
    }
}

/// A phrase entry exactly as it arrives from a phrase source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseDraft {
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub native: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub difficulty_level: Option<LevelValue>,
}

impl PhraseDraft {
    /// Convenience constructor for a bare native/target pair.
    #[must_use]
    pub fn pair(native: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            native: Some(native.into()),
            target: Some(target.into()),
            ..Self::default()
        }
    }

    /// Validate the entry and tag it with the category it was loaded from.
    ///
    /// # Errors
    ///
    /// Returns `PhraseError` when the native or target text is missing or blank.
    pub fn validate(self, category: &str) -> Result<Phrase, PhraseError> {
        let native = normalize_optional(self.native);
        let target = normalize_optional(self.target);

        let (native, target) = match (native, target) {
            (Some(native), Some(target)) => (native, target),
            (None, None) => return Err(PhraseError::Empty),
            (None, Some(target)) => return Err(PhraseError::MissingNative { target }),
            (Some(native), None) => return Err(PhraseError::MissingTarget { native }),
        };

        Ok(Phrase {
            native,
            target,
            direction: self
                .direction
                .as_deref()
                .map(PhraseDirection::parse_lenient)
                .unwrap_or_default(),
            context: normalize_optional(self.context),
            difficulty: self
                .difficulty_level
                .as_ref()
                .map(LevelValue::to_difficulty)
                .unwrap_or_default(),
            category: category.to_owned(),
        })
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

//
// ─── PHRASE ────────────────────────────────────────────────────────────────────
//

/// An immutable native/target phrase pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    native: String,
    target: String,
    direction: PhraseDirection,
    context: Option<String>,
    difficulty: Difficulty,
    category: String,
}

impl Phrase {
    #[must_use]
    pub fn native(&self) -> &str {
        &self.native
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[must_use]
    pub fn text(&self, language: Language) -> &str {
        match language {
            Language::Native => &self.native,
            Language::Target => &self.target,
        }
    }

    #[must_use]
    pub fn direction(&self) -> PhraseDirection {
        self.direction
    }

    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Category the phrase was loaded from.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
