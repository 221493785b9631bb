//! Multi-backend search aggregation.
//!
//! One aggregation call fans out to every enabled backend concurrently,
//! serves cached contributions without touching the network, merges the
//! per-backend lists with first-contributor-wins URL dedup, annotates and
//! ranks the merged list, and reports per backend what happened. A failing
//! backend degrades the result set; it never fails the call.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use docscout_cache::{CacheKey, CacheStore};
use docscout_common::http::ApiClient;
use docscout_common::settings::{ServiceAccountKey, Settings};
use docscout_common::types::{BackendId, BackendResult};
use docscout_common::DocscoutError;

use crate::backends::{
    brave::BraveClient, searchapi::SearchApiClient, serper::SerperClient, yandex::YandexClient,
    BackendError, FetchOutcome, SearchBackend,
};
use crate::data::{brands, domains};
use crate::models::{AggregatedResult, AggregationReport, BackendReport, QuerySpec};
use crate::query::{self, FiletypeSyntax};
use crate::urlnorm::url_fingerprint;

/// Hard ceiling on the merged result list.
pub const MAX_TOTAL_RESULTS: usize = 100;
pub const MAX_RESULTS_PER_BACKEND: usize = 50;

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_GLOBAL_DEADLINE: Duration = Duration::from_secs(90);

/// Per-call knobs for one aggregation.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Backends to use; `None` means every registered backend.
    pub backends: Option<Vec<BackendId>>,
    pub count_per_backend: usize,
    pub use_cache: bool,
    /// Page number folded into the cache key by callers that paginate
    /// upstream queries.
    pub page: Option<u32>,
    /// Cap on the merged list after dedup and ranking.
    pub total_cap: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            backends: None,
            count_per_backend: 20,
            use_cache: true,
            page: None,
            total_cap: MAX_TOTAL_RESULTS,
        }
    }
}

pub struct Aggregator {
    backends: Vec<Arc<dyn SearchBackend>>,
    cache: Option<Arc<CacheStore>>,
    call_timeout: Duration,
    global_deadline: Duration,
}

/// One backend's contribution, in the order backends were requested.
struct Contribution {
    id: BackendId,
    results: Vec<BackendResult>,
    cached: bool,
    error: Option<String>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
            cache: None,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            global_deadline: DEFAULT_GLOBAL_DEADLINE,
        }
    }

    /// Wires up every backend the settings carry credentials for. The
    /// Yandex backend is skipped (with a log line) when no service-account
    /// key file is configured.
    pub fn from_settings(settings: &Settings) -> Result<Self, DocscoutError> {
        let client = ApiClient::new()?;
        let mut agg = Self::new()
            .with_backend(Arc::new(SerperClient::new(
                client.clone(),
                settings.serper_api_key.clone(),
            )))
            .with_backend(Arc::new(BraveClient::new(
                client.clone(),
                settings.brave_api_key.clone(),
            )))
            .with_backend(Arc::new(SearchApiClient::bing(
                client.clone(),
                settings.searchapi_key.clone(),
            )))
            .with_backend(Arc::new(SearchApiClient::google(
                client.clone(),
                settings.searchapi_key.clone(),
            )))
            .with_backend(Arc::new(SearchApiClient::baidu(
                client.clone(),
                settings.searchapi_key.clone(),
            )))
            .with_backend(Arc::new(SearchApiClient::naver(
                client.clone(),
                settings.searchapi_key.clone(),
            )));

        match &settings.yandex_key_file {
            Some(path) => {
                let key = ServiceAccountKey::load(path)?;
                agg = agg.with_backend(Arc::new(YandexClient::new(
                    client,
                    key,
                    settings.yandex_folder_id.clone(),
                )));
            }
            None => info!("no Yandex service account key configured, backend disabled"),
        }

        let store = CacheStore::open(&settings.cache_path, settings.cache_ttl_days)
            .map_err(|e| DocscoutError::Config(format!("cache store unavailable: {e}")))?;
        Ok(agg.with_cache(Arc::new(store)))
    }

    pub fn with_backend(mut self, backend: Arc<dyn SearchBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    pub fn with_cache(mut self, cache: Arc<CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_global_deadline(mut self, deadline: Duration) -> Self {
        self.global_deadline = deadline;
        self
    }

    pub fn cache(&self) -> Option<&Arc<CacheStore>> {
        self.cache.as_ref()
    }

    fn selected(&self, wanted: &Option<Vec<BackendId>>) -> Vec<Arc<dyn SearchBackend>> {
        match wanted {
            None => self.backends.clone(),
            Some(ids) => self
                .backends
                .iter()
                .filter(|b| ids.contains(&b.id()))
                .cloned()
                .collect(),
        }
    }

    /// Searches every selected backend and merges the results.
    #[instrument(skip(self, spec), fields(category = spec.category.as_str(), language = %spec.language))]
    pub async fn search_all(&self, spec: &QuerySpec, opts: &SearchOptions) -> AggregationReport {
        let started = Instant::now();
        let query = query::build_query(spec, FiletypeSyntax::Filetype);
        debug!(%query, "built search query");

        let backends = self.selected(&opts.backends);
        let count = opts.count_per_backend.min(MAX_RESULTS_PER_BACKEND);

        let mut contributions: Vec<Contribution> = Vec::with_capacity(backends.len());
        let mut handles = Vec::new();

        for backend in backends {
            let id = backend.id();
            let key = cache_key(&id, &query, spec, opts.page);

            if opts.use_cache {
                if let Some(store) = &self.cache {
                    match store.get(&key) {
                        Ok(Some(results)) => {
                            debug!(backend = id.as_str(), count = results.len(), "cache hit");
                            contributions.push(Contribution {
                                id,
                                results,
                                cached: true,
                                error: None,
                            });
                            continue;
                        }
                        Ok(None) => {}
                        Err(e) => warn!(backend = id.as_str(), %e, "cache read failed"),
                    }
                }
            }

            let store = self.cache.clone();
            let language = spec.language.clone();
            let query = query.clone();
            let call_timeout = self.call_timeout;
            // The task keeps running past the global deadline so that a slow
            // backend still populates the cache for the next call.
            handles.push((
                id,
                tokio::spawn(async move {
                    let outcome =
                        match tokio::time::timeout(call_timeout, backend.search_pdfs(&query, count, &language))
                            .await
                        {
                            Ok(outcome) => outcome,
                            Err(_) => FetchOutcome::failed(BackendError::Timeout(format!(
                                "no response within {}s",
                                call_timeout.as_secs()
                            ))),
                        };

                    if !outcome.results.is_empty() {
                        if let Some(store) = store {
                            match store.put(&key, &outcome.results) {
                                Ok(merge) => debug!(
                                    backend = id.as_str(),
                                    added = merge.added,
                                    total = merge.total,
                                    "cached results"
                                ),
                                Err(e) => warn!(backend = id.as_str(), %e, "cache write failed"),
                            }
                        }
                    }
                    outcome
                }),
            ));
        }

        let deadline = Instant::now() + self.global_deadline;
        for (id, handle) in handles {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let contribution = match tokio::time::timeout(remaining, handle).await {
                Ok(Ok(outcome)) => Contribution {
                    id,
                    results: outcome.results,
                    cached: false,
                    error: outcome.error.map(|e| e.to_string()),
                },
                Ok(Err(join_err)) => Contribution {
                    id,
                    results: Vec::new(),
                    cached: false,
                    error: Some(format!("task failed: {join_err}")),
                },
                Err(_) => Contribution {
                    id,
                    results: Vec::new(),
                    cached: false,
                    error: Some("aggregation deadline exceeded".to_string()),
                },
            };
            if let Some(err) = &contribution.error {
                warn!(backend = id.as_str(), err, "backend degraded");
            }
            contributions.push(contribution);
        }

        let mut report = merge(contributions, spec.brand.as_deref(), &spec.language);
        rank_results(&mut report.merged_results, &spec.language);
        report.merged_results.truncate(opts.total_cap.min(MAX_TOTAL_RESULTS));
        report.total_search_time = started.elapsed().as_secs_f64();

        info!(
            total = report.merged_results.len(),
            elapsed = report.total_search_time,
            "aggregation finished"
        );
        report
    }

    /// Site-restricted probe across every selected backend. Site probes are
    /// exploratory and bypass the cache.
    #[instrument(skip(self, spec))]
    pub async fn search_site_all(
        &self,
        domain: &str,
        spec: &QuerySpec,
        opts: &SearchOptions,
    ) -> AggregationReport {
        let started = Instant::now();
        let query = query::build_query(spec, FiletypeSyntax::Filetype);
        let backends = self.selected(&opts.backends);
        let count = opts.count_per_backend.min(MAX_RESULTS_PER_BACKEND);

        let mut handles = Vec::new();
        for backend in backends {
            let id = backend.id();
            let domain = domain.to_string();
            let query = query.clone();
            let call_timeout = self.call_timeout;
            handles.push((
                id,
                tokio::spawn(async move {
                    match tokio::time::timeout(call_timeout, backend.search_site(&domain, &query, count))
                        .await
                    {
                        Ok(outcome) => outcome,
                        Err(_) => FetchOutcome::failed(BackendError::Timeout(format!(
                            "no response within {}s",
                            call_timeout.as_secs()
                        ))),
                    }
                }),
            ));
        }

        let mut contributions = Vec::with_capacity(handles.len());
        let deadline = Instant::now() + self.global_deadline;
        for (id, handle) in handles {
            let remaining = deadline.saturating_duration_since(Instant::now());
            contributions.push(match tokio::time::timeout(remaining, handle).await {
                Ok(Ok(outcome)) => Contribution {
                    id,
                    results: outcome.results,
                    cached: false,
                    error: outcome.error.map(|e| e.to_string()),
                },
                Ok(Err(join_err)) => Contribution {
                    id,
                    results: Vec::new(),
                    cached: false,
                    error: Some(format!("task failed: {join_err}")),
                },
                Err(_) => Contribution {
                    id,
                    results: Vec::new(),
                    cached: false,
                    error: Some("aggregation deadline exceeded".to_string()),
                },
            });
        }

        let mut report = merge(contributions, spec.brand.as_deref(), &spec.language);
        report.merged_results.truncate(opts.total_cap.min(MAX_TOTAL_RESULTS));
        report.total_search_time = started.elapsed().as_secs_f64();
        report
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn cache_key(id: &BackendId, query: &str, spec: &QuerySpec, page: Option<u32>) -> CacheKey {
    let mut key = CacheKey::new(id.as_str(), query)
        .language(&spec.language)
        .category(spec.category.as_str());
    if let Some(page) = page {
        key = key.page(page);
    }
    key
}

/// Concatenates contributions in request order, deduplicates by normalized
/// URL (first contributor wins), drops excluded domains, and annotates each
/// survivor.
fn merge(contributions: Vec<Contribution>, brand: Option<&str>, language: &str) -> AggregationReport {
    let mut seen = std::collections::HashSet::new();
    let mut merged: Vec<AggregatedResult> = Vec::new();
    let mut per_backend = Vec::with_capacity(contributions.len());

    for contribution in contributions {
        per_backend.push(BackendReport {
            name: contribution.id.as_str().to_string(),
            count: contribution.results.len(),
            cached: contribution.cached,
            error: contribution.error,
        });

        for result in contribution.results {
            if !seen.insert(url_fingerprint(&result.url)) {
                continue;
            }
            // Cached entries may predate the current exclusion list.
            if domains::is_excluded_domain(&result.url) {
                continue;
            }

            let brand_match = brand
                .map(|b| brands::brand_matches(b, &result.title, &result.snippet, &result.url))
                .unwrap_or(false);
            merged.push(AggregatedResult {
                domain: domains::domain_of(&result.url),
                is_premium: domains::is_premium_domain(&result.url),
                brand_match,
                engine: contribution.id.as_str().to_string(),
                title: result.title,
                url: result.url,
                snippet: result.snippet,
                language: if result.language.is_empty() {
                    language.to_string()
                } else {
                    result.language
                },
                file_size: None,
            });
        }
    }

    AggregationReport {
        per_backend,
        merged_results: merged,
        total_search_time: 0.0,
    }
}

/// Orders results: brand matches first, then the preferred language, then
/// larger known file size. Unknown sizes sort last within their bucket. The
/// sort is stable, so ties keep their merge order.
pub fn rank_results(results: &mut [AggregatedResult], preferred_language: &str) {
    results.sort_by(|a, b| {
        b.brand_match
            .cmp(&a.brand_match)
            .then_with(|| {
                (b.language == preferred_language).cmp(&(a.language == preferred_language))
            })
            .then_with(|| b.file_size.unwrap_or(0).cmp(&a.file_size.unwrap_or(0)))
    });
}
