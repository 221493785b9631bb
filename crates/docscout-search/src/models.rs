//! Request and report types shared across the search crate.

use serde::{Deserialize, Serialize};

use crate::data::categories::Category;

/// What the caller wants to find. Brand and model are optional; the query
/// builder shrinks the query when they are absent rather than failing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySpec {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub category: Category,
    /// Preferred result language, e.g. "en", "tr", "ru".
    pub language: String,
    /// Requested file type; defaults to "pdf".
    pub filetype: String,
}

impl QuerySpec {
    pub fn new(category: Category, language: impl Into<String>) -> Self {
        Self {
            brand: None,
            model: None,
            category,
            language: language.into(),
            filetype: "pdf".to_string(),
        }
    }

    pub fn brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// A merged result with the fields derived during aggregation.
///
/// `file_size` is populated by an external probing step, not by this crate;
/// ranking treats a missing size as unknown and sorts it last within its
/// rank bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    /// Backend that contributed this result first.
    pub engine: String,
    pub language: String,
    pub domain: String,
    pub is_premium: bool,
    pub brand_match: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

/// Per-backend outcome of one aggregation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendReport {
    pub name: String,
    /// Results the backend contributed before cross-backend dedup.
    pub count: usize,
    /// True when the contribution was served from the cache store.
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The full outcome of `Aggregator::search_all`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationReport {
    pub per_backend: Vec<BackendReport>,
    pub merged_results: Vec<AggregatedResult>,
    /// Wall-clock seconds spent in the aggregation call.
    pub total_search_time: f64,
}

impl AggregationReport {
    /// Results `page` (1-based) of `per_page` entries each.
    pub fn page(&self, page: usize, per_page: usize) -> &[AggregatedResult] {
        if per_page == 0 {
            return &[];
        }
        let page = page.max(1);
        let start = (page - 1) * per_page;
        if start >= self.merged_results.len() {
            return &[];
        }
        let end = (start + per_page).min(self.merged_results.len());
        &self.merged_results[start..end]
    }

    /// Splits the merged list into (premium, free) without reordering.
    pub fn split_premium(&self) -> (Vec<&AggregatedResult>, Vec<&AggregatedResult>) {
        self.merged_results.iter().partition(|r| r.is_premium)
    }
}
