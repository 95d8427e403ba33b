mod list_key;
mod phrase;
mod progress;
mod settings;

pub use list_key::{ListKey, ParseListKeyError};
pub use phrase::{Difficulty, Language, LevelValue, Phrase, PhraseDirection, PhraseDraft, PhraseError};
pub use progress::ProgressState;
pub use settings::{
    PlayOrder, PlaybackDirection, PlaybackSettings, PlaybackSettingsDraft, SettingsError,
    VoiceGender,
};
