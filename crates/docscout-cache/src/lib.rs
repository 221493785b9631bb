//! docscout-cache: Persisted per-(backend, query, language, category, page)
//! search-result cache with merge-on-write semantics.
//!
//! Repeated fetches for the same key accumulate into a superset of every URL
//! ever seen for that key; entries are never replaced wholesale.

pub mod error;
pub mod key;
pub mod store;

pub use error::CacheError;
pub use key::CacheKey;
pub use store::{CacheStats, CacheStore, EvictScope, MergeOutcome};
