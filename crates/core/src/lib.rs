#![forbid(unsafe_code)]

pub mod catalog;
pub mod model;
pub mod playback;
pub mod shuffle;
pub mod text;
pub mod time;
pub mod timing;

pub use catalog::{ALL_LISTS, LoadReport, PhraseStore, SkippedPhrase};
pub use time::Clock;
pub use timing::TimingProfile;
