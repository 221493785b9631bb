//! Brand alias table and brand-match check.
//!
//! Many manufacturers are commonly written under short forms ("cat" for
//! Caterpillar, "jd" for John Deere); the alias table maps each known brand
//! to every spelling that counts as a match.

/// (canonical brand, accepted aliases). Lookup key is the lowercased brand
/// from the query; aliases are matched as substrings of title+snippet+url.
const BRAND_ALIASES: &[(&str, &[&str])] = &[
    ("caterpillar", &["cat", "caterpillar"]),
    ("cat", &["cat", "caterpillar"]),
    ("komatsu", &["komatsu", "komats"]),
    ("hitachi", &["hitachi", "hitachi-c"]),
    ("volvo", &["volvo", "volvo ce"]),
    ("jcb", &["jcb"]),
    ("liebherr", &["liebherr"]),
    ("doosan", &["doosan", "daewoo"]),
    ("hyundai", &["hyundai", "hce"]),
    ("kobelco", &["kobelco"]),
    ("case", &["case", "case ih", "caseih"]),
    ("john deere", &["john deere", "deere", "jd"]),
    ("kubota", &["kubota"]),
    ("bobcat", &["bobcat"]),
    ("takeuchi", &["takeuchi"]),
    ("yanmar", &["yanmar"]),
    ("ihi", &["ihi"]),
    ("sumitomo", &["sumitomo"]),
    ("hidromek", &["hidromek"]),
    ("xcmg", &["xcmg"]),
    ("sany", &["sany"]),
    ("zoomlion", &["zoomlion"]),
    ("liugong", &["liugong"]),
    ("shantui", &["shantui"]),
];

/// True if the brand (or any of its aliases) appears in the hit's title,
/// snippet, or URL.
pub fn brand_matches(brand: &str, title: &str, snippet: &str, url: &str) -> bool {
    let brand_lower = brand.to_lowercase();
    let brand_lower = brand_lower.trim();
    if brand_lower.is_empty() {
        return false;
    }

    let text = format!("{} {} {}", title, snippet, url).to_lowercase();

    if text.contains(brand_lower) {
        return true;
    }

    BRAND_ALIASES
        .iter()
        .find(|(name, _)| *name == brand_lower)
        .map(|(_, aliases)| aliases.iter().any(|a| text.contains(a)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_brand_match() {
        assert!(brand_matches(
            "Hitachi",
            "ZX200 Parts Catalog",
            "hitachi excavator parts",
            "https://example.com/zx200.pdf"
        ));
    }

    #[test]
    fn test_alias_match_ticker_to_full_name() {
        // "cat" query matches a document that only mentions Caterpillar.
        assert!(brand_matches(
            "cat",
            "Caterpillar 320D Parts Manual",
            "",
            "https://example.com/320d.pdf"
        ));
    }

    #[test]
    fn test_alias_match_in_url_only() {
        assert!(brand_matches(
            "john deere",
            "Tractor manual",
            "",
            "https://manuals.example.com/jd/5075e.pdf"
        ));
    }

    #[test]
    fn test_no_match() {
        assert!(!brand_matches(
            "komatsu",
            "Volvo EC210 service manual",
            "volvo construction equipment",
            "https://example.com/ec210.pdf"
        ));
    }

    #[test]
    fn test_empty_brand_never_matches() {
        assert!(!brand_matches("", "anything", "", "https://a.com/x.pdf"));
    }
}
