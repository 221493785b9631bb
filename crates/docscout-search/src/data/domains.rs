//! Domain lists: premium (paid/registration-gated) platforms and excluded
//! low-value commercial/social sites.

/// Platforms that gate downloads behind payment or registration. Hits from
/// these are kept but flagged so callers can split free/premium.
pub const PREMIUM_DOMAINS: &[&str] = &[
    // Document sharing platforms
    "scribd.com",
    "issuu.com",
    "academia.edu",
    "researchgate.net",
    "slideshare.net",
    "calameo.com",
    "yumpu.com",
    // PDF platforms
    "pdfcoffee.com",
    "pdfdrive.com",
    "pdfslide.net",
    "dokumen.tips",
    "fdocuments.net",
    "vdocuments.net",
    "cupdf.com",
    "vsepdf.com",
    "manualzz.com",
    // Chinese platforms
    "wenku.baidu.com",
    "docin.com",
    "book118.com",
    "doc88.com",
    "360doc.com",
    "max.book118.com",
    // Russian platforms
    "studfile.net",
    "topuch.ru",
    "studopedia.ru",
    // Other
    "slideshare.jp",
    "happycampus.com",
];

/// Commercial/social sites excluded from results entirely.
pub const EXCLUDED_DOMAINS: &[&str] = &[
    // E-commerce
    "ebay.com",
    "ebay.de",
    "ebay.co.uk",
    "ebay.fr",
    "amazon.com",
    "amazon.de",
    "amazon.co.uk",
    "aliexpress.com",
    "alibaba.com",
    // Manual resellers
    "autoepcservice.com",
    "epcatalogs.com",
    "heavymanuals.com",
    "themanualman.com",
    "sellfy.com",
    "payhip.com",
    // Spam / low quality
    "pinterest.com",
    "facebook.com",
    "twitter.com",
    "youtube.com",
];

pub fn is_premium_domain(url: &str) -> bool {
    let url_lower = url.to_lowercase();
    PREMIUM_DOMAINS.iter().any(|d| url_lower.contains(d))
}

pub fn is_excluded_domain(url: &str) -> bool {
    let url_lower = url.to_lowercase();
    EXCLUDED_DOMAINS.iter().any(|d| url_lower.contains(d))
}

/// Host part of a URL, lowercased; empty string when unparseable.
pub fn domain_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_premium_detection() {
        assert!(is_premium_domain("https://www.scribd.com/doc/123/zx200"));
        assert!(!is_premium_domain("https://hitachicm.com/manuals/zx200.pdf"));
    }

    #[test]
    fn test_excluded_detection() {
        assert!(is_excluded_domain("https://www.ebay.com/itm/321"));
        assert!(is_excluded_domain("HTTPS://WWW.PINTEREST.COM/pin/1"));
        assert!(!is_excluded_domain("https://parts.cat.com/en/catalog.pdf"));
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("https://Parts.CAT.com/en/x.pdf"), "parts.cat.com");
        assert_eq!(domain_of("not a url"), "");
    }
}
