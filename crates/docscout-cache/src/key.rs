//! Composite cache key.
//!
//! Two requests that differ only by page number are distinct entries: each
//! page has an independent TTL and merge history, which matters because
//! backends are page-limited and a caller may request more than one page
//! worth of results.

use sha2::{Digest, Sha256};

/// Scopes a cached result set to one backend, query, language, category, and
/// page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub backend: String,
    pub query: String,
    pub language: Option<String>,
    pub category: Option<String>,
    pub page: Option<u32>,
}

impl CacheKey {
    pub fn new(backend: &str, query: &str) -> Self {
        Self {
            backend: backend.to_string(),
            query: query.to_string(),
            language: None,
            category: None,
            page: None,
        }
    }

    pub fn language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Stable hex digest used as the unique row key. Query text is lowercased
    /// and trimmed so cosmetic differences hit the same entry.
    pub fn digest(&self) -> String {
        let mut parts = vec![self.backend.clone(), self.query.to_lowercase().trim().to_string()];
        if let Some(ref lang) = self.language {
            parts.push(lang.clone());
        }
        if let Some(ref cat) = self.category {
            parts.push(cat.clone());
        }
        if let Some(page) = self.page {
            parts.push(format!("p{}", page));
        }

        let mut hasher = Sha256::new();
        hasher.update(parts.join("|").as_bytes());
        hex_string(&hasher.finalize())
    }
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
