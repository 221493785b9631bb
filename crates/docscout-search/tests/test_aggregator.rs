//! Aggregation behavior against scripted in-process backends.
//!
//! No network: each mock backend serves canned result lists, fails on
//! demand, or stalls to exercise the timeout paths.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use docscout_cache::CacheStore;
use docscout_common::types::{BackendId, BackendResult};
use docscout_search::backends::{BackendError, FetchOutcome, SearchBackend};
use docscout_search::{Aggregator, Category, QuerySpec, SearchOptions};

fn init_logging() {
    let _ = tracing_subscriber::fmt::try_init();
}

fn hit(url: &str, title: &str) -> BackendResult {
    BackendResult {
        title: title.to_string(),
        url: url.to_string(),
        snippet: String::new(),
        source: String::new(),
        language: "en".to_string(),
    }
}

/// Serves one canned response list per call, in order; repeats the last
/// one when the script runs out.
struct ScriptedBackend {
    id: BackendId,
    script: Mutex<VecDeque<Vec<BackendResult>>>,
    fail: bool,
    delay: Option<Duration>,
}

impl ScriptedBackend {
    fn returning(id: BackendId, results: Vec<BackendResult>) -> Self {
        Self {
            id,
            script: Mutex::new(VecDeque::from([results])),
            fail: false,
            delay: None,
        }
    }

    fn scripted(id: BackendId, responses: Vec<Vec<BackendResult>>) -> Self {
        Self {
            id,
            script: Mutex::new(VecDeque::from(responses)),
            fail: false,
            delay: None,
        }
    }

    fn failing(id: BackendId) -> Self {
        Self {
            id,
            script: Mutex::new(VecDeque::new()),
            fail: true,
            delay: None,
        }
    }

    fn stalling(id: BackendId, delay: Duration) -> Self {
        Self {
            id,
            script: Mutex::new(VecDeque::from([vec![hit(
                "https://slow.example.com/late.pdf",
                "late",
            )]])),
            fail: false,
            delay: Some(delay),
        }
    }

    fn next_response(&self) -> Vec<BackendResult> {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap_or_default()
        }
    }
}

#[async_trait]
impl SearchBackend for ScriptedBackend {
    fn id(&self) -> BackendId {
        self.id
    }

    async fn search_pdfs(&self, _query: &str, count: usize, _language: &str) -> FetchOutcome {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return FetchOutcome::failed(BackendError::Transport("connection refused".to_string()));
        }
        let mut results = self.next_response();
        results.truncate(count);
        FetchOutcome::ok(results)
    }

    async fn search_site(&self, _domain: &str, _query: &str, count: usize) -> FetchOutcome {
        self.search_pdfs("", count, "en").await
    }
}

fn spec() -> QuerySpec {
    QuerySpec::new(Category::PartsCatalog, "en").brand("caterpillar")
}

#[tokio::test]
async fn test_backend_failure_degrades_gracefully() {
    init_logging();
    let agg = Aggregator::new()
        .with_backend(Arc::new(ScriptedBackend::failing(BackendId::Serper)))
        .with_backend(Arc::new(ScriptedBackend::returning(
            BackendId::Brave,
            vec![
                hit("https://a.com/1.pdf", "one"),
                hit("https://a.com/2.pdf", "two"),
                hit("https://a.com/3.pdf", "three"),
            ],
        )));

    let report = agg.search_all(&spec(), &SearchOptions::default()).await;

    assert_eq!(report.merged_results.len(), 3);
    let serper = report
        .per_backend
        .iter()
        .find(|b| b.name == "serper")
        .unwrap();
    assert_eq!(serper.count, 0);
    assert!(serper.error.as_deref().unwrap().contains("connection refused"));
    let brave = report.per_backend.iter().find(|b| b.name == "brave").unwrap();
    assert_eq!(brave.count, 3);
    assert!(brave.error.is_none());
}

#[tokio::test]
async fn test_cross_backend_dedup_of_url_variants() {
    init_logging();
    let agg = Aggregator::new()
        .with_backend(Arc::new(ScriptedBackend::returning(
            BackendId::Serper,
            vec![hit("https://www.example.com/manual.pdf", "from serper")],
        )))
        .with_backend(Arc::new(ScriptedBackend::returning(
            BackendId::Brave,
            vec![
                hit("http://example.com/manual.pdf", "protocol variant"),
                hit("HTTPS://EXAMPLE.COM/MANUAL.PDF", "case variant"),
                hit("https://example.com/manual.pdf/", "slash variant"),
                hit("https://example.com/other.pdf", "genuinely new"),
            ],
        )));

    let report = agg.search_all(&spec(), &SearchOptions::default()).await;

    assert_eq!(report.merged_results.len(), 2);
    assert_eq!(report.merged_results[0].engine, "serper");
    assert_eq!(report.merged_results[0].title, "from serper");
}

#[tokio::test]
async fn test_brand_matches_rank_first() {
    init_logging();
    let agg = Aggregator::new().with_backend(Arc::new(ScriptedBackend::returning(
        BackendId::Serper,
        vec![
            hit("https://a.com/komatsu.pdf", "Komatsu PC200 parts"),
            hit("https://a.com/cat320.pdf", "CAT 320D parts catalog"),
        ],
    )));

    let report = agg.search_all(&spec(), &SearchOptions::default()).await;

    assert!(report.merged_results[0].brand_match);
    assert!(report.merged_results[0].url.contains("cat320"));
    assert!(!report.merged_results[1].brand_match);
}

#[tokio::test]
async fn test_second_call_is_served_from_cache() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(CacheStore::open(dir.path().join("cache.db"), 30).unwrap());
    let agg = Aggregator::new()
        .with_backend(Arc::new(ScriptedBackend::returning(
            BackendId::Serper,
            vec![hit("https://a.com/1.pdf", "one")],
        )))
        .with_cache(cache);

    let opts = SearchOptions::default();
    let first = agg.search_all(&spec(), &opts).await;
    assert!(!first.per_backend[0].cached);

    let second = agg.search_all(&spec(), &opts).await;
    assert!(second.per_backend[0].cached);
    assert_eq!(second.merged_results.len(), 1);
    assert_eq!(second.merged_results[0].url, "https://a.com/1.pdf");
}

#[tokio::test]
async fn test_cache_accumulates_across_calls() {
    init_logging();
    let cache = Arc::new(CacheStore::in_memory(1).unwrap());
    let agg = Aggregator::new()
        .with_backend(Arc::new(ScriptedBackend::scripted(
            BackendId::Serper,
            vec![
                vec![hit("https://a.com/a.pdf", "a"), hit("https://a.com/b.pdf", "b")],
                vec![hit("https://a.com/b.pdf", "b"), hit("https://a.com/c.pdf", "c")],
            ],
        )))
        .with_cache(cache);

    let fresh = SearchOptions {
        use_cache: false,
        ..SearchOptions::default()
    };
    agg.search_all(&spec(), &fresh).await;
    agg.search_all(&spec(), &fresh).await;

    // The cached entry is the union of both fetches.
    let cached = agg.search_all(&spec(), &SearchOptions::default()).await;
    assert!(cached.per_backend[0].cached);
    let mut urls: Vec<&str> = cached
        .merged_results
        .iter()
        .map(|r| r.url.as_str())
        .collect();
    urls.sort();
    assert_eq!(
        urls,
        vec!["https://a.com/a.pdf", "https://a.com/b.pdf", "https://a.com/c.pdf"]
    );
}

#[tokio::test]
async fn test_stalling_backend_times_out_without_blocking_others() {
    init_logging();
    let agg = Aggregator::new()
        .with_backend(Arc::new(ScriptedBackend::stalling(
            BackendId::Serper,
            Duration::from_secs(30),
        )))
        .with_backend(Arc::new(ScriptedBackend::returning(
            BackendId::Brave,
            vec![hit("https://a.com/fast.pdf", "fast")],
        )))
        .with_call_timeout(Duration::from_millis(100));

    let report = agg.search_all(&spec(), &SearchOptions::default()).await;

    assert_eq!(report.merged_results.len(), 1);
    assert_eq!(report.merged_results[0].url, "https://a.com/fast.pdf");
    let serper = report
        .per_backend
        .iter()
        .find(|b| b.name == "serper")
        .unwrap();
    assert!(serper.error.as_deref().unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_excluded_domains_dropped_in_merge() {
    init_logging();
    let agg = Aggregator::new().with_backend(Arc::new(ScriptedBackend::returning(
        BackendId::Serper,
        vec![
            hit("https://www.ebay.com/itm/manual.pdf", "listing"),
            hit("https://oem.example.com/manual.pdf", "manual"),
        ],
    )));

    let report = agg.search_all(&spec(), &SearchOptions::default()).await;

    assert_eq!(report.merged_results.len(), 1);
    assert_eq!(report.merged_results[0].domain, "oem.example.com");
}

#[tokio::test]
async fn test_premium_annotation() {
    init_logging();
    let agg = Aggregator::new().with_backend(Arc::new(ScriptedBackend::returning(
        BackendId::Serper,
        vec![
            hit("https://www.scribd.com/doc/320d-manual.pdf", "320D manual"),
            hit("https://oem.example.com/320d.pdf", "320D manual"),
        ],
    )));

    let report = agg.search_all(&spec(), &SearchOptions::default()).await;

    let premium: Vec<_> = report.merged_results.iter().filter(|r| r.is_premium).collect();
    assert_eq!(premium.len(), 1);
    assert!(premium[0].url.contains("scribd"));
}

#[tokio::test]
async fn test_total_cap_applies_after_merge() {
    init_logging();
    let many: Vec<BackendResult> = (0..30)
        .map(|i| hit(&format!("https://a.com/{i}.pdf"), "doc"))
        .collect();
    let agg = Aggregator::new().with_backend(Arc::new(ScriptedBackend::returning(
        BackendId::Serper,
        many,
    )));

    let opts = SearchOptions {
        count_per_backend: 50,
        total_cap: 10,
        ..SearchOptions::default()
    };
    let report = agg.search_all(&spec(), &opts).await;
    assert_eq!(report.merged_results.len(), 10);
}

#[tokio::test]
async fn test_site_search_merges_without_cache() {
    init_logging();
    let cache = Arc::new(CacheStore::in_memory(1).unwrap());
    let agg = Aggregator::new()
        .with_backend(Arc::new(ScriptedBackend::returning(
            BackendId::Serper,
            vec![hit("https://manuals.example.com/a.pdf", "a")],
        )))
        .with_cache(cache.clone());

    let report = agg
        .search_site_all("manuals.example.com", &spec(), &SearchOptions::default())
        .await;

    assert_eq!(report.merged_results.len(), 1);
    // Site probes never touch the cache store.
    assert_eq!(cache.stats().unwrap().total, 0);
}
