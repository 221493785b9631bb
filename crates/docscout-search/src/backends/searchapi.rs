//! SearchApi.io client.
//! https://www.searchapi.io/
//!
//! One client serves four engines (Bing, Google, Baidu, Naver) behind the
//! same GET endpoint with page-number pagination, capped at 5 pages.

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use docscout_common::http::ApiClient;
use docscout_common::types::{BackendId, BackendResult};

use super::{filter_hits, BackendError, FetchOutcome, SearchBackend};

const DEFAULT_BASE_URL: &str = "https://www.searchapi.io/api/v1/search";
const MAX_PAGES: usize = 5;
const PAGE_SIZE: usize = 20;

/// Engines reachable through searchapi.io.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Bing,
    Google,
    Baidu,
    Naver,
}

impl Engine {
    fn param(self) -> &'static str {
        match self {
            Engine::Bing => "bing",
            Engine::Google => "google",
            Engine::Baidu => "baidu",
            Engine::Naver => "naver",
        }
    }

    fn backend_id(self) -> BackendId {
        match self {
            Engine::Bing => BackendId::SearchApiBing,
            Engine::Google => BackendId::SearchApiGoogle,
            Engine::Baidu => BackendId::SearchApiBaidu,
            Engine::Naver => BackendId::SearchApiNaver,
        }
    }

    /// Naver does not honor the filter token; a bare "pdf" term works better.
    fn pdf_query(self, query: &str) -> String {
        match self {
            Engine::Naver => {
                let stripped = query.replace("filetype:pdf", "").trim().to_string();
                format!("{stripped} pdf")
            }
            _ => query.to_string(),
        }
    }
}

pub struct SearchApiClient {
    client: ApiClient,
    api_key: String,
    base_url: String,
    engine: Engine,
    /// Language pinned by the engine, if any (Baidu serves zh, Naver ko).
    pinned_language: Option<&'static str>,
}

impl SearchApiClient {
    pub fn new(client: ApiClient, api_key: impl Into<String>, engine: Engine) -> Self {
        let pinned_language = match engine {
            Engine::Baidu => Some("zh"),
            Engine::Naver => Some("ko"),
            _ => None,
        };
        Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            engine,
            pinned_language,
        }
    }

    pub fn bing(client: ApiClient, api_key: impl Into<String>) -> Self {
        Self::new(client, api_key, Engine::Bing)
    }

    pub fn google(client: ApiClient, api_key: impl Into<String>) -> Self {
        Self::new(client, api_key, Engine::Google)
    }

    pub fn baidu(client: ApiClient, api_key: impl Into<String>) -> Self {
        Self::new(client, api_key, Engine::Baidu)
    }

    pub fn naver(client: ApiClient, api_key: impl Into<String>) -> Self {
        Self::new(client, api_key, Engine::Naver)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[instrument(skip(self))]
    async fn fetch_page(
        &self,
        query: &str,
        page: usize,
        wanted: usize,
        language: &str,
    ) -> Result<Vec<BackendResult>, BackendError> {
        let num = wanted.min(PAGE_SIZE).to_string();
        let page_s = page.to_string();
        let params = [
            ("api_key", self.api_key.as_str()),
            ("engine", self.engine.param()),
            ("q", query),
            ("num", num.as_str()),
            ("page", page_s.as_str()),
            ("hl", language),
        ];

        let resp = self.client.get(&self.base_url)?.query(&params).send().await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(BackendError::Auth(format!("searchapi returned {status}")));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Transport(format!("searchapi {status}: {body}")));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        let source = self.engine.backend_id().as_str().to_string();
        let hits = body["organic_results"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|item| {
                        // Some engines report the URL under "url" instead of "link".
                        let url = item["link"]
                            .as_str()
                            .or_else(|| item["url"].as_str())
                            .unwrap_or_default();
                        let snippet = item["snippet"]
                            .as_str()
                            .or_else(|| item["description"].as_str())
                            .unwrap_or_default();
                        BackendResult {
                            title: item["title"].as_str().unwrap_or_default().to_string(),
                            url: url.to_string(),
                            snippet: snippet.to_string(),
                            source: source.clone(),
                            language: language.to_string(),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(hits)
    }

    async fn collect(&self, query: &str, count: usize, language: &str) -> FetchOutcome {
        let query = self.engine.pdf_query(query);
        let language = self.pinned_language.unwrap_or(language);
        let mut results: Vec<BackendResult> = Vec::new();

        for page in 1..=MAX_PAGES {
            if results.len() >= count {
                break;
            }
            let wanted = count - results.len();
            match self.fetch_page(&query, page, wanted, language).await {
                Ok(hits) => {
                    if hits.is_empty() {
                        break;
                    }
                    let exhausted = hits.len() < 10;
                    results.extend(filter_hits("pdf", hits).into_iter().take(wanted));
                    if exhausted {
                        debug!(page, engine = self.engine.param(), "searchapi exhausted");
                        break;
                    }
                }
                Err(err) => {
                    warn!(page, %err, "searchapi page failed, keeping partial results");
                    return FetchOutcome::partial(results, err);
                }
            }
        }

        FetchOutcome::ok(results)
    }
}

#[async_trait]
impl SearchBackend for SearchApiClient {
    fn id(&self) -> BackendId {
        self.engine.backend_id()
    }

    async fn search_pdfs(&self, query: &str, count: usize, language: &str) -> FetchOutcome {
        self.collect(query, count, language).await
    }

    async fn search_site(&self, domain: &str, query: &str, count: usize) -> FetchOutcome {
        let site_query = if query.is_empty() {
            format!("site:{domain} filetype:pdf")
        } else {
            format!("{query} site:{domain}")
        };
        self.collect(&site_query, count, "en").await
    }
}
