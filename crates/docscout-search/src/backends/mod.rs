//! Search backend clients.

pub mod brave;
pub mod searchapi;
pub mod serper;
pub mod yandex;

use async_trait::async_trait;
use thiserror::Error;

use docscout_common::types::{BackendId, BackendResult};

use crate::data::domains;

/// Failures a backend call can report. Callers record these per backend
/// alongside whatever results were collected before the failure.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("response could not be decoded: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Transport(err.to_string())
    }
}

impl From<docscout_common::DocscoutError> for BackendError {
    fn from(err: docscout_common::DocscoutError) -> Self {
        BackendError::Transport(err.to_string())
    }
}

/// What one backend call produced. Errors are values here: a call that
/// failed mid-pagination still returns the pages it already collected.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub results: Vec<BackendResult>,
    pub error: Option<BackendError>,
}

impl FetchOutcome {
    pub fn ok(results: Vec<BackendResult>) -> Self {
        Self { results, error: None }
    }

    pub fn failed(error: BackendError) -> Self {
        Self { results: Vec::new(), error: Some(error) }
    }

    pub fn partial(results: Vec<BackendResult>, error: BackendError) -> Self {
        Self { results, error: Some(error) }
    }
}

/// Common interface for all search backend clients.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn id(&self) -> BackendId;

    /// Run the query and collect up to `count` document hits. Never
    /// returns `Err`: transport and auth failures travel inside the
    /// outcome together with any partial results.
    async fn search_pdfs(&self, query: &str, count: usize, language: &str) -> FetchOutcome;

    /// Site-restricted probe of a single domain.
    async fn search_site(&self, domain: &str, query: &str, count: usize) -> FetchOutcome;
}

/// True if the hit plausibly points at a document of the requested type.
/// Backends report non-PDF pages even under a filetype filter; the URL,
/// title or snippet must carry the type indicator.
pub fn is_filetype_hit(filetype: &str, url: &str, title: &str, snippet: &str) -> bool {
    let needle = format!(".{}", filetype.to_lowercase());
    let token = filetype.to_lowercase();
    url.to_lowercase().contains(&needle)
        || title.to_lowercase().contains(&token)
        || snippet.to_lowercase().contains(&token)
}

/// Applies the shared relevance filters to raw hits: file-type indicator
/// required, excluded domains dropped.
pub fn filter_hits(filetype: &str, hits: Vec<BackendResult>) -> Vec<BackendResult> {
    hits.into_iter()
        .filter(|hit| is_filetype_hit(filetype, &hit.url, &hit.title, &hit.snippet))
        .filter(|hit| !domains::is_excluded_domain(&hit.url))
        .collect()
}
