use std::collections::BTreeMap;
use std::env;
use std::path::Path;

use phrase_core::model::PhraseDraft;
use phrase_core::{LoadReport, PhraseStore};
use reqwest::Client;
use reqwest::header::REFERER;
use tracing::{info, warn};

use crate::error::PhraseSourceError;

/// Category name to its raw phrase entries, as served by every source.
pub type RawCatalog = BTreeMap<String, Vec<PhraseDraft>>;

/// Parse the category map shared by the JSON file and the admin endpoint.
///
/// # Errors
///
/// Returns `PhraseSourceError::Json` when the text is not a category map.
pub fn parse_catalog(json: &str) -> Result<RawCatalog, PhraseSourceError> {
    Ok(serde_json::from_str(json)?)
}

/// Read a catalog from a JSON file on disk.
///
/// # Errors
///
/// Returns `PhraseSourceError` when the file cannot be read or parsed.
pub async fn read_file(path: impl AsRef<Path>) -> Result<RawCatalog, PhraseSourceError> {
    let raw = tokio::fs::read_to_string(path.as_ref()).await?;
    parse_catalog(&raw)
}

/// Load `raw` into `store`, logging every entry that was skipped.
pub fn load_into(store: &mut PhraseStore, raw: RawCatalog) -> LoadReport {
    let report = store.load_categories(raw);
    for skipped in &report.skipped {
        warn!(
            category = %skipped.category,
            position = skipped.position,
            error = %skipped.error,
            "skipping phrase entry"
        );
    }
    info!(
        loaded = report.loaded,
        skipped = report.skipped.len(),
        categories = store.categories().count(),
        "phrase catalog loaded"
    );
    report
}

//
// ─── ADMIN ENDPOINT ────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct RemoteSourceConfig {
    pub url: String,
}

impl RemoteSourceConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let url = env::var("PHRASE_ADMIN_URL").ok()?;
        if url.trim().is_empty() {
            return None;
        }
        Some(Self {
            url: url.trim().to_string(),
        })
    }
}

/// Fetches the phrase catalog from the admin endpoint's `getList` action.
#[derive(Clone)]
pub struct RemotePhraseSource {
    client: Client,
    config: Option<RemoteSourceConfig>,
}

impl RemotePhraseSource {
    #[must_use]
    pub fn new(config: Option<RemoteSourceConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// # Errors
    ///
    /// Returns `PhraseSourceError` when the source is disabled, the request
    /// fails, or the body is not a category map.
    pub async fn fetch(&self) -> Result<RawCatalog, PhraseSourceError> {
        let config = self.config.as_ref().ok_or(PhraseSourceError::Disabled)?;

        // The endpoint rejects requests without a referer.
        let response = self
            .client
            .post(&config.url)
            .header(REFERER, &config.url)
            .form(&[("action", "getList"), ("data", "{}")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PhraseSourceError::HttpStatus(response.status()));
        }

        let body = response.text().await?;
        parse_catalog(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phrase_core::ALL_LISTS;
    use phrase_core::model::PlayOrder;

    const SAMPLE: &str = r#"{
        "present_simple": [
            {"target": "I work", "native": "Я работаю", "difficulty_level": 2},
            {"target": "You read (books)", "native": "Ты читаешь"}
        ],
        "greetings": [
            {"target": "Hello", "native": "Привет", "direction": "native-target"},
            {"target": "", "native": "Пока"}
        ]
    }"#;

    #[test]
    fn parses_category_map_in_sorted_order() {
        let raw = parse_catalog(SAMPLE).unwrap();
        let names: Vec<_> = raw.keys().map(String::as_str).collect();
        assert_eq!(names, ["greetings", "present_simple"]);
        assert_eq!(raw["present_simple"].len(), 2);
    }

    #[test]
    fn rejects_non_map_payload() {
        assert!(matches!(
            parse_catalog("[1, 2, 3]"),
            Err(PhraseSourceError::Json(_))
        ));
    }

    #[test]
    fn load_into_skips_incomplete_entries() {
        let mut store = PhraseStore::new();
        let report = load_into(&mut store, parse_catalog(SAMPLE).unwrap());

        assert_eq!(report.loaded, 3);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].category, "greetings");
        assert_eq!(report.skipped[0].position, 1);

        let all = store.build_list(ALL_LISTS, PlayOrder::Sequential, None);
        assert_eq!(all[0].target(), "Hello");
        assert_eq!(all[1].category(), "present_simple");
    }

    #[tokio::test]
    async fn read_file_loads_json_from_disk() {
        let path = std::env::temp_dir().join(format!("phrases-{}.json", std::process::id()));
        tokio::fs::write(&path, SAMPLE).await.unwrap();
        let raw = read_file(&path).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;
        assert_eq!(raw.len(), 2);
    }

    #[tokio::test]
    async fn read_file_reports_missing_file() {
        let err = read_file("/definitely/not/here.json").await.unwrap_err();
        assert!(matches!(err, PhraseSourceError::Io(_)));
    }

    #[tokio::test]
    async fn disabled_remote_source_refuses_to_fetch() {
        let source = RemotePhraseSource::new(None);
        assert!(!source.enabled());
        assert!(matches!(
            source.fetch().await,
            Err(PhraseSourceError::Disabled)
        ));
    }
}
