use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use crate::error::DocscoutError;

/// A capability-capped HTTP client that only allows requests to approved
/// search-API hosts. Every backend adapter goes through this client, so a
/// misconfigured base URL or a redirect into an arbitrary host fails closed.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl ApiClient {
    /// Creates a new client with the default allowlist of search backends.
    pub fn new() -> Result<Self, DocscoutError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, DocscoutError> {
        let mut allowlist = HashSet::new();
        let domains = vec![
            "google.serper.dev",              // Serper (Google SERP)
            "api.search.brave.com",           // Brave Search
            "www.searchapi.io",               // SearchApi.io (Bing/Baidu/Naver)
            "iam.api.cloud.yandex.net",       // Yandex IAM token exchange
            "searchapi.api.cloud.yandex.net", // Yandex async search submit
            "operation.api.cloud.yandex.net", // Yandex operation polling
            "localhost",
            "127.0.0.1",
        ];

        for d in domains {
            allowlist.insert(d.to_string());
        }

        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| DocscoutError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Validates if a URL is permitted under the current policy.
    pub fn is_allowed(&self, url: &str) -> bool {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                // Exact match or subdomain of an allowed domain
                for allowed in &self.allowlist {
                    if host == allowed || host.ends_with(&format!(".{}", allowed)) {
                        return true;
                    }
                }
            }
        }
        false
    }

    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, DocscoutError> {
        if !self.is_allowed(url) {
            return Err(DocscoutError::Security(format!(
                "host not in allowlist for URL {}",
                url
            )));
        }
        Ok(self.client.get(url))
    }

    pub fn post(&self, url: &str) -> Result<reqwest::RequestBuilder, DocscoutError> {
        if !self.is_allowed(url) {
            return Err(DocscoutError::Security(format!(
                "host not in allowlist for URL {}",
                url
            )));
        }
        Ok(self.client.post(url))
    }
}
