//! In-memory phrase catalog grouped by category.

use crate::model::{ListKey, Phrase, PhraseDraft, PhraseError, PlayOrder};
use crate::shuffle::shuffled;

/// Synthetic list name that concatenates every category.
pub const ALL_LISTS: &str = "all";

/// An entry that was dropped while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPhrase {
    pub category: String,
    /// Position of the entry within its category's raw array.
    pub position: usize,
    pub error: PhraseError,
}

/// Outcome of a best-effort load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<SkippedPhrase>,
}

impl LoadReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

#[derive(Debug, Clone)]
struct Category {
    name: String,
    phrases: Vec<Phrase>,
}

/// Ordered collection of phrase categories.
///
/// Categories keep the order in which they were first loaded, so `"all"`
/// lists and shuffles built from the same data are reproducible.
#[derive(Debug, Clone, Default)]
pub struct PhraseStore {
    categories: Vec<Category>,
}

impl PhraseStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingests raw categories.
    ///
    /// Invalid entries are skipped and listed in the report. Loading a
    /// category that already exists replaces its phrases in place.
    pub fn load_categories<I, S>(&mut self, raw: I) -> LoadReport
    where
        I: IntoIterator<Item = (S, Vec<PhraseDraft>)>,
        S: Into<String>,
    {
        let mut report = LoadReport::default();

        for (name, drafts) in raw {
            let name = name.into();
            let mut phrases = Vec::with_capacity(drafts.len());
            for (position, draft) in drafts.into_iter().enumerate() {
                match draft.validate(&name) {
                    Ok(phrase) => phrases.push(phrase),
                    Err(error) => report.skipped.push(SkippedPhrase {
                        category: name.clone(),
                        position,
                        error,
                    }),
                }
            }
            report.loaded += phrases.len();

            match self.categories.iter_mut().find(|c| c.name == name) {
                Some(existing) => existing.phrases = phrases,
                None => self.categories.push(Category { name, phrases }),
            }
        }

        report
    }

    /// Builds the playable list for `list_type`.
    ///
    /// `"all"` concatenates every category; an unknown category yields an
    /// empty list. Random order needs a seed; without one the catalog order
    /// is kept.
    #[must_use]
    pub fn build_list(&self, list_type: &str, order: PlayOrder, seed: Option<u64>) -> Vec<Phrase> {
        let base: Vec<Phrase> = if list_type == ALL_LISTS {
            self.categories
                .iter()
                .flat_map(|c| c.phrases.iter().cloned())
                .collect()
        } else {
            self.categories
                .iter()
                .find(|c| c.name == list_type)
                .map(|c| c.phrases.clone())
                .unwrap_or_default()
        };

        match (order, seed) {
            (PlayOrder::Random, Some(seed)) => shuffled(&base, seed),
            _ => base,
        }
    }

    /// Number of phrases `build_list` would return for `list_type`.
    #[must_use]
    pub fn list_len(&self, list_type: &str) -> usize {
        if list_type == ALL_LISTS {
            self.total_len()
        } else {
            self.category_len(list_type)
        }
    }

    /// Key under which progress for `list_type` in `order` is stored.
    #[must_use]
    pub fn list_key(&self, list_type: &str, order: PlayOrder) -> ListKey {
        ListKey::new(list_type, order, self.list_len(list_type))
    }

    /// Category names in catalog order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    #[must_use]
    pub fn category_len(&self, name: &str) -> usize {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .map_or(0, |c| c.phrases.len())
    }

    #[must_use]
    pub fn total_len(&self) -> usize {
        self.categories.iter().map(|c| c.phrases.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PhraseStore {
        let mut store = PhraseStore::new();
        let report = store.load_categories([
            (
                "greetings",
                vec![
                    PhraseDraft::pair("Привет", "Hello"),
                    PhraseDraft::pair("Пока", "Bye"),
                ],
            ),
            (
                "present_simple",
                vec![
                    PhraseDraft::pair("Я здесь", "I am here"),
                    PhraseDraft {
                        native: Some("Без пары".into()),
                        ..PhraseDraft::default()
                    },
                    PhraseDraft::pair("Он работает", "He works"),
                    PhraseDraft::pair("Мы читаем", "We read"),
                ],
            ),
        ]);
        assert_eq!(report.loaded, 5);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].category, "present_simple");
        assert_eq!(report.skipped[0].position, 1);
        store
    }

    #[test]
    fn all_list_concatenates_in_catalog_order() {
        let store = store();
        let all = store.build_list(ALL_LISTS, PlayOrder::Sequential, None);
        assert_eq!(all.len(), store.category_len("greetings") + store.category_len("present_simple"));
        assert_eq!(all[0].target(), "Hello");
        assert_eq!(all[0].category(), "greetings");
        assert_eq!(all[2].category(), "present_simple");
        assert_eq!(store.categories().collect::<Vec<_>>(), ["greetings", "present_simple"]);
    }

    #[test]
    fn unknown_category_is_empty() {
        let store = store();
        assert!(store.build_list("nope", PlayOrder::Sequential, None).is_empty());
        assert_eq!(store.list_key("nope", PlayOrder::Random).to_string(), "nope_random_0");
    }

    #[test]
    fn random_list_is_reproducible_and_source_untouched() {
        let store = store();
        let a = store.build_list(ALL_LISTS, PlayOrder::Random, Some(42));
        let b = store.build_list(ALL_LISTS, PlayOrder::Random, Some(42));
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);

        let seq = store.build_list(ALL_LISTS, PlayOrder::Sequential, Some(42));
        assert_eq!(seq[0].target(), "Hello");
        assert_eq!(seq[4].target(), "We read");
    }

    #[test]
    fn reloading_category_replaces_it() {
        let mut store = store();
        store.load_categories([("greetings", vec![PhraseDraft::pair("Да", "Yes")])]);
        assert_eq!(store.category_len("greetings"), 1);
        assert_eq!(store.total_len(), 4);
        assert_eq!(store.list_key(ALL_LISTS, PlayOrder::Sequential).to_string(), "all_sequential_4");
        assert_eq!(store.categories().next(), Some("greetings"));
    }
}
