//! Query string construction.
//!
//! All backends share one query language: quoted terms are mandatory,
//! unquoted terms are soft relevance boosts. Only the file-type filter token
//! differs per backend.

use crate::data::categories::{self, Category};
use crate::models::QuerySpec;

/// How a backend spells the file-type constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiletypeSyntax {
    /// `filetype:pdf` (Serper, Brave, SearchApi engines).
    Filetype,
    /// `mime:pdf` (Yandex).
    Mime,
}

impl FiletypeSyntax {
    fn render(self, filetype: &str) -> String {
        match self {
            FiletypeSyntax::Filetype => format!("filetype:{filetype}"),
            FiletypeSyntax::Mime => format!("mime:{filetype}"),
        }
    }
}

/// Builds the search query for a spec.
///
/// Order is fixed: quoted brand, quoted model, quoted category core keyword,
/// unquoted category variant words, file-type filter. Missing optional parts
/// shrink the query; the function never fails.
pub fn build_query(spec: &QuerySpec, syntax: FiletypeSyntax) -> String {
    let language = categories::supported(&spec.language);
    let mut parts: Vec<String> = Vec::new();

    if let Some(brand) = spec.brand.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
        parts.push(format!("\"{brand}\""));
    }
    if let Some(model) = spec.model.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        parts.push(format!("\"{model}\""));
    }

    parts.push(format!("\"{}\"", categories::core_keyword(language, spec.category)));

    let variants = categories::variant_words(language, spec.category);
    if !variants.is_empty() {
        parts.push(variants.join(" "));
    }

    parts.push(syntax.render(&spec.filetype));
    parts.join(" ")
}

/// Builds a site-restricted query for probing a single domain.
pub fn build_site_query(domain: &str, spec: &QuerySpec, syntax: FiletypeSyntax) -> String {
    format!("site:{} {}", domain.trim(), build_query(spec, syntax))
}

/// Rewrites the standard filter token into the given backend's syntax.
/// Used when one already-built query string must be reissued to a backend
/// with a different token spelling.
pub fn rewrite_filetype(query: &str, from: FiletypeSyntax, to: FiletypeSyntax) -> String {
    if from == to {
        return query.to_string();
    }
    let (old, new) = match (from, to) {
        (FiletypeSyntax::Filetype, FiletypeSyntax::Mime) => ("filetype:", "mime:"),
        (FiletypeSyntax::Mime, FiletypeSyntax::Filetype) => ("mime:", "filetype:"),
        _ => return query.to_string(),
    };
    query.replace(old, new)
}
