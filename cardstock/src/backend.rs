//! Backend service contract and the HTTP client against it
//!
//! The card database service is an external collaborator: the coordinator
//! consumes it through the [`Backend`] trait and never retries. A failed
//! fetch leaves prior cached data in place and surfaces as an error
//! notification.

use std::collections::HashMap;
use std::future::Future;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::model::{CardDocument, CardType, SearchQuery, SourceDescriptor};
use crate::state::SearchSettings;

/// Page size accepted by the card-documents endpoint.
pub const CARDS_PAGE_SIZE: usize = 1000;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{name}: {message}")]
    Api { name: String, message: String },
}

/// The search/database service consumed by the coordinator.
///
/// Implementations are injected into the engine (no ambient singletons);
/// [`HttpBackend`] talks to the real service, the mock in
/// [`crate::testing`] stays in memory.
pub trait Backend: Send + Sync + 'static {
    /// Fetch the source list, in backend ordering.
    fn sources(&self) -> impl Future<Output = Result<Vec<SourceDescriptor>, BackendError>> + Send;

    /// Fetch search results for a set of queries under the given settings.
    fn search_results(
        &self,
        settings: &SearchSettings,
        queries: &[SearchQuery],
    ) -> impl Future<Output = Result<HashMap<String, HashMap<CardType, Vec<String>>>, BackendError>> + Send;

    /// Fetch card metadata for up to [`CARDS_PAGE_SIZE`] identifiers.
    fn cards(
        &self,
        identifiers: &[String],
    ) -> impl Future<Output = Result<HashMap<String, CardDocument>, BackendError>> + Send;

    /// Fetch the cardback list (the default cardback query), possibly
    /// filtered by the given settings.
    fn cardbacks(
        &self,
        settings: &SearchSettings,
    ) -> impl Future<Output = Result<Vec<String>, BackendError>> + Send;
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchSettingsBody {
    search_type_settings: SearchTypeSettingsBody,
    source_settings: SourceSettingsBody,
    filter_settings: FilterSettingsBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchTypeSettingsBody {
    fuzzy_search: bool,
    filter_cardbacks: bool,
}

#[derive(Debug, Serialize)]
struct SourceSettingsBody {
    /// `[pk, enabled]` pairs in priority order.
    sources: Vec<(i64, bool)>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FilterSettingsBody {
    #[serde(rename = "minimumDPI")]
    minimum_dpi: u32,
    #[serde(rename = "maximumDPI")]
    maximum_dpi: u32,
    maximum_size: u32,
    languages: Vec<String>,
    includes_tags: Vec<String>,
    excludes_tags: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SearchResultsRequest {
    #[serde(rename = "searchSettings")]
    search_settings: SearchSettingsBody,
    queries: Vec<SearchQuery>,
}

#[derive(Debug, Serialize)]
struct CardbacksRequest {
    #[serde(rename = "searchSettings")]
    search_settings: SearchSettingsBody,
}

#[derive(Debug, Serialize)]
struct CardsRequest {
    card_identifiers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SourcesResponse {
    results: HashMap<String, SourceDescriptor>,
}

#[derive(Debug, Deserialize)]
struct SearchResultsResponse {
    results: HashMap<String, HashMap<CardType, Vec<String>>>,
}

#[derive(Debug, Deserialize)]
struct CardsResponse {
    results: HashMap<String, CardDocument>,
}

#[derive(Debug, Deserialize)]
struct CardbacksResponse {
    cardbacks: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    name: String,
    #[serde(default)]
    message: String,
}

// ============================================================================
// HTTP client
// ============================================================================

/// HTTP client for the card database service.
///
/// The service addresses enabled sources by primary key on the wire, while
/// settings hold source keys; the client remembers the key→pk mapping from
/// its latest source-list fetch to translate between the two.
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
    source_pks: RwLock<HashMap<String, i64>>,
}

impl HttpBackend {
    /// Create a client for the service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a client reusing an existing `reqwest::Client`.
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            client,
            source_pks: RwLock::new(HashMap::new()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let response = self.client.get(self.url(path)).send().await?;
        decode(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        decode(response).await
    }

    async fn settings_body(&self, settings: &SearchSettings) -> SearchSettingsBody {
        let pks = self.source_pks.read().await;
        let sources = settings
            .sources
            .iter()
            .filter_map(|key| pks.get(key).map(|&pk| (pk, true)))
            .collect();
        SearchSettingsBody {
            search_type_settings: SearchTypeSettingsBody {
                fuzzy_search: settings.fuzzy_search,
                filter_cardbacks: settings.filter_cardbacks,
            },
            source_settings: SourceSettingsBody { sources },
            filter_settings: FilterSettingsBody {
                minimum_dpi: settings.min_dpi,
                maximum_dpi: settings.max_dpi,
                maximum_size: settings.max_size_mb,
                languages: settings.languages.clone(),
                includes_tags: settings.includes_tags.clone(),
                excludes_tags: settings.excludes_tags.clone(),
            },
        }
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
    if response.status().is_success() {
        return Ok(response.json().await?);
    }
    match response.json::<ApiErrorBody>().await {
        Ok(body) => Err(BackendError::Api {
            name: body.name,
            message: body.message,
        }),
        Err(err) => Err(BackendError::Request(err)),
    }
}

impl Backend for HttpBackend {
    async fn sources(&self) -> Result<Vec<SourceDescriptor>, BackendError> {
        let response: SourcesResponse = self.get_json("/2/sources/").await?;
        let mut sources: Vec<SourceDescriptor> = response.results.into_values().collect();
        sources.sort_by_key(|s| s.pk);
        let mut pks = self.source_pks.write().await;
        pks.clear();
        pks.extend(sources.iter().map(|s| (s.key.clone(), s.pk)));
        Ok(sources)
    }

    async fn search_results(
        &self,
        settings: &SearchSettings,
        queries: &[SearchQuery],
    ) -> Result<HashMap<String, HashMap<CardType, Vec<String>>>, BackendError> {
        let request = SearchResultsRequest {
            search_settings: self.settings_body(settings).await,
            queries: queries.to_vec(),
        };
        let response: SearchResultsResponse =
            self.post_json("/2/searchResults/", &request).await?;
        Ok(response.results)
    }

    async fn cards(
        &self,
        identifiers: &[String],
    ) -> Result<HashMap<String, CardDocument>, BackendError> {
        let request = CardsRequest {
            card_identifiers: identifiers.to_vec(),
        };
        let response: CardsResponse = self.post_json("/2/cards/", &request).await?;
        Ok(response.results)
    }

    async fn cardbacks(&self, settings: &SearchSettings) -> Result<Vec<String>, BackendError> {
        let request = CardbacksRequest {
            search_settings: self.settings_body(settings).await,
        };
        let response: CardbacksResponse = self.post_json("/2/cardbacks/", &request).await?;
        Ok(response.cardbacks)
    }
}
