//! Serper.dev client (Google organic results).
//! https://serper.dev/
//!
//! POST JSON per page, 10 hits a page, capped at 10 pages per call.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, instrument, warn};

use docscout_common::http::ApiClient;
use docscout_common::types::{BackendId, BackendResult};

use super::{filter_hits, BackendError, FetchOutcome, SearchBackend};

const DEFAULT_BASE_URL: &str = "https://google.serper.dev";
const PAGE_SIZE: usize = 10;
const MAX_PAGES: usize = 10;

pub struct SerperClient {
    client: ApiClient,
    api_key: String,
    base_url: String,
}

impl SerperClient {
    pub fn new(client: ApiClient, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Points the client at an alternate endpoint. The host must still be
    /// on the [`ApiClient`] allowlist.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[instrument(skip(self))]
    async fn fetch_page(
        &self,
        query: &str,
        page: usize,
        language: &str,
    ) -> Result<Vec<BackendResult>, BackendError> {
        let payload = json!({
            "q": query,
            "num": PAGE_SIZE,
            "page": page,
            "hl": language,
        });

        let resp = self
            .client
            .post(&format!("{}/search", self.base_url))?
            .header("X-API-KEY", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(BackendError::Auth(format!("serper returned {status}")));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Transport(format!("serper {status}: {body}")));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        let hits = body["organic"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|item| BackendResult {
                        title: item["title"].as_str().unwrap_or_default().to_string(),
                        url: item["link"].as_str().unwrap_or_default().to_string(),
                        snippet: item["snippet"].as_str().unwrap_or_default().to_string(),
                        source: BackendId::Serper.as_str().to_string(),
                        language: language.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(hits)
    }

    async fn collect(&self, query: &str, count: usize, language: &str) -> FetchOutcome {
        let mut results: Vec<BackendResult> = Vec::new();

        for page in 1..=MAX_PAGES {
            if results.len() >= count {
                break;
            }
            match self.fetch_page(query, page, language).await {
                Ok(hits) => {
                    let exhausted = hits.len() < PAGE_SIZE;
                    let wanted = count.saturating_sub(results.len());
                    results.extend(filter_hits("pdf", hits).into_iter().take(wanted));
                    if exhausted {
                        debug!(page, "serper exhausted");
                        break;
                    }
                }
                Err(err) => {
                    warn!(page, %err, "serper page failed, keeping partial results");
                    return FetchOutcome::partial(results, err);
                }
            }
        }

        FetchOutcome::ok(results)
    }
}

#[async_trait]
impl SearchBackend for SerperClient {
    fn id(&self) -> BackendId {
        BackendId::Serper
    }

    async fn search_pdfs(&self, query: &str, count: usize, language: &str) -> FetchOutcome {
        self.collect(query, count, language).await
    }

    async fn search_site(&self, domain: &str, query: &str, count: usize) -> FetchOutcome {
        let site_query = if query.is_empty() {
            format!("site:{domain} filetype:pdf")
        } else {
            format!("site:{domain} {query}")
        };
        self.collect(&site_query, count, "en").await
    }
}
