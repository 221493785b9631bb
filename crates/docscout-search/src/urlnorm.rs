//! URL normalization for cross-backend deduplication.
//!
//! Backends report the same document under cosmetically different URLs
//! (http vs https, with or without `www.`, trailing slashes, mixed case,
//! percent-encoded characters). Normalization collapses those variants so
//! the aggregator keeps a single copy.

use percent_encoding::percent_decode_str;
use sha2::{Digest, Sha256};

/// Canonical form of a URL used as the dedup key.
///
/// Percent-decodes, lowercases, then strips the scheme, a leading `www.`
/// and any trailing slash. Two URLs that normalize to the same string are
/// treated as the same document.
pub fn normalize_url(url: &str) -> String {
    let decoded = percent_decode_str(url.trim())
        .decode_utf8()
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| url.trim().to_string());

    let mut s = decoded.to_lowercase();

    for scheme in ["https://", "http://"] {
        if let Some(rest) = s.strip_prefix(scheme) {
            s = rest.to_string();
            break;
        }
    }
    if let Some(rest) = s.strip_prefix("www.") {
        s = rest.to_string();
    }
    while s.ends_with('/') {
        s.pop();
    }

    s
}

/// Stable hex fingerprint of the normalized URL, suitable as a map key.
pub fn url_fingerprint(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_url(url).as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_is_stripped() {
        assert_eq!(
            normalize_url("https://example.com/manual.pdf"),
            normalize_url("http://example.com/manual.pdf")
        );
    }

    #[test]
    fn test_www_and_trailing_slash_are_stripped() {
        assert_eq!(
            normalize_url("https://www.example.com/docs/"),
            "example.com/docs"
        );
    }

    #[test]
    fn test_case_is_folded() {
        assert_eq!(
            normalize_url("HTTPS://Example.COM/Manual.PDF"),
            "example.com/manual.pdf"
        );
    }

    #[test]
    fn test_percent_encoding_is_decoded() {
        assert_eq!(
            normalize_url("https://example.com/parts%20catalog.pdf"),
            "example.com/parts catalog.pdf"
        );
    }

    #[test]
    fn test_fingerprints_collapse_variants() {
        let variants = [
            "https://www.example.com/a.pdf",
            "http://example.com/a.pdf",
            "HTTP://WWW.EXAMPLE.COM/a.pdf",
            "https://example.com/a.pdf/",
        ];
        let first = url_fingerprint(variants[0]);
        for v in &variants[1..] {
            assert_eq!(url_fingerprint(v), first, "variant {v} did not collapse");
        }
    }

    #[test]
    fn test_distinct_urls_stay_distinct() {
        assert_ne!(
            url_fingerprint("https://example.com/a.pdf"),
            url_fingerprint("https://example.com/b.pdf")
        );
    }
}
