//! Shared data types used by both the cache and the search crates.

use serde::{Deserialize, Serialize};

/// One hit from one search backend.
///
/// `url` is always non-empty; adapters drop hits without a URL. The other
/// fields may be empty strings when a backend omits them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    /// Identifier of the backend that produced the hit (e.g. "brave").
    pub source: String,
    pub language: String,
}

/// Identifies one external search backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendId {
    Serper,
    Brave,
    SearchApiBing,
    SearchApiGoogle,
    SearchApiBaidu,
    SearchApiNaver,
    Yandex,
}

impl BackendId {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendId::Serper          => "serper",
            BackendId::Brave           => "brave",
            BackendId::SearchApiBing   => "searchapi_bing",
            BackendId::SearchApiGoogle => "searchapi_google",
            BackendId::SearchApiBaidu  => "searchapi_baidu",
            BackendId::SearchApiNaver  => "searchapi_naver",
            BackendId::Yandex          => "yandex",
        }
    }

    /// Human-readable name shown in per-backend reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            BackendId::Serper          => "Google (Serper)",
            BackendId::Brave           => "Brave Search",
            BackendId::SearchApiBing   => "Bing (SearchApi)",
            BackendId::SearchApiGoogle => "Google (SearchApi)",
            BackendId::SearchApiBaidu  => "Baidu (SearchApi)",
            BackendId::SearchApiNaver  => "Naver (SearchApi)",
            BackendId::Yandex          => "Yandex",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "serper"           => Some(BackendId::Serper),
            "brave"            => Some(BackendId::Brave),
            "searchapi_bing"   => Some(BackendId::SearchApiBing),
            "searchapi_google" => Some(BackendId::SearchApiGoogle),
            "searchapi_baidu"  => Some(BackendId::SearchApiBaidu),
            "searchapi_naver"  => Some(BackendId::SearchApiNaver),
            "yandex"           => Some(BackendId::Yandex),
            _ => None,
        }
    }
}

impl std::fmt::Display for BackendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_id_roundtrip() {
        for id in [
            BackendId::Serper,
            BackendId::Brave,
            BackendId::SearchApiBing,
            BackendId::SearchApiGoogle,
            BackendId::SearchApiBaidu,
            BackendId::SearchApiNaver,
            BackendId::Yandex,
        ] {
            assert_eq!(BackendId::parse(id.as_str()), Some(id));
        }
        assert_eq!(BackendId::parse("altavista"), None);
    }
}
