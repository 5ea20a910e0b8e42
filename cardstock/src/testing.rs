//! In-memory test doubles for the backend and config store

use std::collections::{HashMap, HashSet};
use std::sync::Mutex as StdMutex;

use tokio::sync::Mutex;

use crate::backend::{Backend, BackendError};
use crate::config::{ConfigStore, PersistedSettings};
use crate::model::{CardDocument, CardType, SearchQuery, SourceDescriptor};
use crate::state::SearchSettings;

/// Build a source descriptor for tests.
pub fn source(key: &str, pk: i64) -> SourceDescriptor {
    SourceDescriptor {
        pk,
        key: key.into(),
        name: key.to_uppercase(),
        source_type: "gdrive".into(),
        external_link: None,
        description: String::new(),
    }
}

/// Build a card document for tests.
pub fn document(identifier: &str, card_type: CardType) -> CardDocument {
    CardDocument {
        identifier: identifier.into(),
        card_type,
        name: identifier.into(),
        priority: 0,
        source: "drive-a".into(),
        source_name: "DRIVE-A".into(),
        source_verbose: "Drive A".into(),
        dpi: 600,
        extension: "png".into(),
        date: "2024-01-01".into(),
        size: 1_000_000,
        download_link: None,
        small_thumbnail_url: None,
        medium_thumbnail_url: None,
        tags: Vec::new(),
        language: "EN".into(),
    }
}

#[derive(Default)]
struct MockData {
    sources: Vec<SourceDescriptor>,
    results: HashMap<SearchQuery, Vec<String>>,
    cardbacks: Vec<String>,
    failing: HashSet<&'static str>,
    search_calls: usize,
    cardback_calls: usize,
    card_calls: usize,
}

/// Programmable in-memory [`Backend`].
///
/// Responses resolve immediately. Endpoints can be told to fail by name
/// (`"sources"`, `"searchResults"`, `"cards"`, `"cardbacks"`); card
/// documents are synthesized for any requested identifier.
#[derive(Default)]
pub struct MockBackend {
    data: Mutex<MockData>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_sources(&self, sources: Vec<SourceDescriptor>) {
        self.data.lock().await.sources = sources;
    }

    pub async fn set_results(&self, query: SearchQuery, hits: Vec<String>) {
        self.data.lock().await.results.insert(query, hits);
    }

    pub async fn set_cardbacks(&self, cardbacks: Vec<String>) {
        self.data.lock().await.cardbacks = cardbacks;
    }

    /// Make an endpoint fail until [`MockBackend::succeed`] is called.
    pub async fn fail(&self, endpoint: &'static str) {
        self.data.lock().await.failing.insert(endpoint);
    }

    /// Let a previously failing endpoint succeed again.
    pub async fn succeed(&self, endpoint: &'static str) {
        self.data.lock().await.failing.remove(endpoint);
    }

    /// How many search-result fetches have been served.
    pub async fn search_calls(&self) -> usize {
        self.data.lock().await.search_calls
    }

    /// How many cardback fetches have been served.
    pub async fn cardback_calls(&self) -> usize {
        self.data.lock().await.cardback_calls
    }

    /// How many card-document fetches have been served.
    pub async fn card_calls(&self) -> usize {
        self.data.lock().await.card_calls
    }

    fn error(endpoint: &str) -> BackendError {
        BackendError::Api {
            name: "Mock failure".into(),
            message: format!("endpoint {endpoint} told to fail"),
        }
    }
}

impl Backend for MockBackend {
    async fn sources(&self) -> Result<Vec<SourceDescriptor>, BackendError> {
        let data = self.data.lock().await;
        if data.failing.contains("sources") {
            return Err(Self::error("sources"));
        }
        Ok(data.sources.clone())
    }

    async fn search_results(
        &self,
        _settings: &SearchSettings,
        queries: &[SearchQuery],
    ) -> Result<HashMap<String, HashMap<CardType, Vec<String>>>, BackendError> {
        let mut data = self.data.lock().await;
        if data.failing.contains("searchResults") {
            return Err(Self::error("searchResults"));
        }
        data.search_calls += 1;
        let mut results: HashMap<String, HashMap<CardType, Vec<String>>> = HashMap::new();
        for query in queries {
            let hits = data.results.get(query).cloned().unwrap_or_default();
            results
                .entry(query.query.clone())
                .or_default()
                .insert(query.card_type, hits);
        }
        Ok(results)
    }

    async fn cards(
        &self,
        identifiers: &[String],
    ) -> Result<HashMap<String, CardDocument>, BackendError> {
        let mut data = self.data.lock().await;
        if data.failing.contains("cards") {
            return Err(Self::error("cards"));
        }
        data.card_calls += 1;
        Ok(identifiers
            .iter()
            .map(|id| (id.clone(), document(id, CardType::Card)))
            .collect())
    }

    async fn cardbacks(&self, _settings: &SearchSettings) -> Result<Vec<String>, BackendError> {
        let mut data = self.data.lock().await;
        if data.failing.contains("cardbacks") {
            return Err(Self::error("cardbacks"));
        }
        data.cardback_calls += 1;
        Ok(data.cardbacks.clone())
    }
}

/// [`ConfigStore`] backed by process memory.
#[derive(Default)]
pub struct MemoryConfigStore {
    settings: StdMutex<Option<PersistedSettings>>,
}

impl MemoryConfigStore {
    /// Start with the given settings already persisted.
    pub fn with_settings(settings: PersistedSettings) -> Self {
        Self {
            settings: StdMutex::new(Some(settings)),
        }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Option<PersistedSettings> {
        self.settings.lock().expect("config lock").clone()
    }

    fn save(&self, settings: &PersistedSettings) -> std::io::Result<()> {
        *self.settings.lock().expect("config lock") = Some(settings.clone());
        Ok(())
    }
}
