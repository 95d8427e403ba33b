//! Text helpers shared by speech output and recognition matching.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// `(...)` or `[...]` annotation, innermost only.
static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^()]*\)|\[[^\]\[]*\]").unwrap());

/// Normalizes text for recognition comparison.
///
/// Lowercases, strips diacritics (NFD then drops combining marks), removes
/// punctuation, collapses whitespace and trims.
#[must_use]
pub fn normalize(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    collapse_whitespace(&stripped)
}

/// True when the heard transcript matches the expected phrase after
/// normalization.
#[must_use]
pub fn matches(heard: &str, expected: &str) -> bool {
    normalize(heard) == normalize(expected)
}

/// Text to hand to a speech engine: bracketed annotations such as
/// `(informal)` or `[UK]` are dropped.
#[must_use]
pub fn speakable(text: &str) -> String {
    collapse_whitespace(&BRACKETED.replace_all(text, " "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_case_accents_and_punctuation() {
        assert_eq!(normalize("  Où est   la GARE ? "), "ou est la gare");
        assert_eq!(normalize("Hello, world!"), "hello world");
        assert_eq!(normalize("Ёлка"), "елка");
    }

    #[test]
    fn matches_ignores_formatting() {
        assert!(matches("i am here", "I am here."));
        assert!(matches("cafe", "Café"));
        assert!(!matches("i was here", "I am here"));
    }

    #[test]
    fn speakable_drops_annotations() {
        assert_eq!(speakable("You (plural) are [US] here"), "You are here");
        assert_eq!(speakable("Plain text"), "Plain text");
        assert_eq!(speakable("(only note)"), "");
    }
}
