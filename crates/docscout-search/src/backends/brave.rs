//! Brave Search API client.
//! https://api.search.brave.com/
//!
//! GET with offset pagination, 20 hits a page, offset caps at 200. Brave
//! spells a few language codes its own way, hence the remap table.

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use docscout_common::http::ApiClient;
use docscout_common::types::{BackendId, BackendResult};

use super::{filter_hits, BackendError, FetchOutcome, SearchBackend};

const DEFAULT_BASE_URL: &str = "https://api.search.brave.com/res/v1/web/search";
const PAGE_SIZE: usize = 20;
const MAX_OFFSET: usize = 200;

/// Brave's spelling of language codes that differ from ISO 639-1.
fn brave_language(language: &str) -> &str {
    match language {
        "zh" => "zh-hans",
        "ja" => "jp",
        other => other,
    }
}

pub struct BraveClient {
    client: ApiClient,
    api_key: String,
    base_url: String,
}

impl BraveClient {
    pub fn new(client: ApiClient, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[instrument(skip(self))]
    async fn fetch_page(
        &self,
        query: &str,
        offset: usize,
        wanted: usize,
        language: &str,
    ) -> Result<Vec<BackendResult>, BackendError> {
        let count = wanted.min(PAGE_SIZE).to_string();
        let offset_s = offset.to_string();
        let params = [
            ("q", query),
            ("count", count.as_str()),
            ("offset", offset_s.as_str()),
            ("search_lang", brave_language(language)),
            ("text_decorations", "false"),
        ];

        let resp = self
            .client
            .get(&self.base_url)?
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .query(&params)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(BackendError::Auth(format!("brave returned {status}")));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Transport(format!("brave {status}: {body}")));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        let hits = body["web"]["results"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|item| BackendResult {
                        title: item["title"].as_str().unwrap_or_default().to_string(),
                        url: item["url"].as_str().unwrap_or_default().to_string(),
                        snippet: item["description"].as_str().unwrap_or_default().to_string(),
                        source: BackendId::Brave.as_str().to_string(),
                        language: language.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(hits)
    }

    async fn collect(&self, query: &str, count: usize, language: &str) -> FetchOutcome {
        let mut results: Vec<BackendResult> = Vec::new();
        let mut offset = 0;

        while results.len() < count && offset < MAX_OFFSET {
            let wanted = count - results.len();
            match self.fetch_page(query, offset, wanted, language).await {
                Ok(hits) => {
                    if hits.is_empty() {
                        break;
                    }
                    let exhausted = hits.len() < PAGE_SIZE;
                    results.extend(filter_hits("pdf", hits).into_iter().take(wanted));
                    if exhausted {
                        debug!(offset, "brave exhausted");
                        break;
                    }
                }
                Err(err) => {
                    warn!(offset, %err, "brave page failed, keeping partial results");
                    return FetchOutcome::partial(results, err);
                }
            }
            offset += PAGE_SIZE;
        }

        FetchOutcome::ok(results)
    }
}

#[async_trait]
impl SearchBackend for BraveClient {
    fn id(&self) -> BackendId {
        BackendId::Brave
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_remap() {
        assert_eq!(brave_language("zh"), "zh-hans");
        assert_eq!(brave_language("ja"), "jp");
        assert_eq!(brave_language("en"), "en");
        assert_eq!(brave_language("tr"), "tr");
    }
}
