//! docscout-search: Multi-backend PDF document discovery.
//!
//! Builds category-aware search queries, fans them out to several search
//! backends concurrently, and merges the results into a single deduplicated,
//! annotated, ranked list with a per-backend report of what happened.

pub mod aggregator;
pub mod backends;
pub mod data;
pub mod models;
pub mod query;
pub mod urlnorm;

pub use aggregator::{rank_results, Aggregator, SearchOptions, MAX_TOTAL_RESULTS};
pub use backends::{BackendError, FetchOutcome, SearchBackend};
pub use data::categories::Category;
pub use models::{AggregatedResult, AggregationReport, BackendReport, QuerySpec};
pub use query::{build_query, build_site_query, FiletypeSyntax};
