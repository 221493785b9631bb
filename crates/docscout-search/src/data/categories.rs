//! Document categories and per-language search term tables.
//!
//! Each category has, per language, a *core keyword* (mandatory, quoted in
//! the final query) and a set of known phrasings whose remaining words become
//! optional soft-boost terms. Unsupported languages fall back to the English
//! tables; unknown category names fall back to the parts catalog.

use serde::{Deserialize, Serialize};

/// Default language whose term tables back every unsupported language code.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Words too generic to carry signal as optional terms.
const STOP_WORDS: &[&str] = &["the", "and", "of", "for", "ve"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    PartsCatalog,
    ServiceManual,
    ElectricalDiagram,
    HydraulicDiagram,
    Troubleshooting,
}

impl Default for Category {
    fn default() -> Self {
        Category::PartsCatalog
    }
}

impl Category {
    /// Resolve a category name, honoring legacy aliases. Never fails: an
    /// unknown name maps to the default parts catalog.
    pub fn parse(name: &str) -> Self {
        match name {
            "parts_catalog" | "parts" | "parts_book" | "parts_manual" | "parts_list" => {
                Category::PartsCatalog
            }
            "service_manual" | "service" | "repair_manual" | "workshop_manual"
            | "shop_manual" => Category::ServiceManual,
            "electrical_diagram" | "electrical" | "wiring_diagram" => Category::ElectricalDiagram,
            "hydraulic_diagram" | "hydraulic" => Category::HydraulicDiagram,
            "troubleshooting" | "fault_codes" => Category::Troubleshooting,
            _ => Category::PartsCatalog,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::PartsCatalog      => "parts_catalog",
            Category::ServiceManual     => "service_manual",
            Category::ElectricalDiagram => "electrical_diagram",
            Category::HydraulicDiagram  => "hydraulic_diagram",
            Category::Troubleshooting   => "troubleshooting",
        }
    }

    /// Human-readable label for UI layers.
    pub fn label(&self) -> &'static str {
        match self {
            Category::PartsCatalog      => "Parts catalog",
            Category::ServiceManual     => "Service / repair manual",
            Category::ElectricalDiagram => "Electrical diagram",
            Category::HydraulicDiagram  => "Hydraulic diagram",
            Category::Troubleshooting   => "Troubleshooting / fault codes",
        }
    }

    pub fn all() -> &'static [Category] {
        &[
            Category::PartsCatalog,
            Category::ServiceManual,
            Category::ElectricalDiagram,
            Category::HydraulicDiagram,
            Category::Troubleshooting,
        ]
    }
}

/// The mandatory keyword for a category in a given language.
pub fn core_keyword(language: &str, category: Category) -> &'static str {
    match (supported(language), category) {
        ("tr", Category::PartsCatalog)      => "parça",
        ("tr", Category::ServiceManual)     => "servis",
        ("tr", Category::ElectricalDiagram) => "elektrik",
        ("tr", Category::HydraulicDiagram)  => "hidrolik",
        ("tr", Category::Troubleshooting)   => "arıza",
        ("ru", Category::PartsCatalog)      => "запчастей",
        ("ru", Category::ServiceManual)     => "ремонту",
        ("ru", Category::ElectricalDiagram) => "электрическая",
        ("ru", Category::HydraulicDiagram)  => "гидравлическая",
        ("ru", Category::Troubleshooting)   => "неисправностей",
        (_, Category::PartsCatalog)         => "parts",
        (_, Category::ServiceManual)        => "service",
        (_, Category::ElectricalDiagram)    => "wiring",
        (_, Category::HydraulicDiagram)     => "hydraulic",
        (_, Category::Troubleshooting)      => "fault",
    }
}

/// Known phrasings of a category in a given language.
pub fn phrasings(language: &str, category: Category) -> &'static [&'static str] {
    match (supported(language), category) {
        ("tr", Category::PartsCatalog) => &[
            "yedek parça kataloğu",
            "parça kataloğu",
            "yedek parça listesi",
            "parça kitabı",
        ],
        ("tr", Category::ServiceManual) => &[
            "servis kılavuzu",
            "tamir kılavuzu",
            "bakım kılavuzu",
            "atölye kılavuzu",
        ],
        ("tr", Category::ElectricalDiagram) => &[
            "elektrik şeması",
            "kablo şeması",
            "elektrik devre şeması",
        ],
        ("tr", Category::HydraulicDiagram) => &[
            "hidrolik şema",
            "hidrolik devre şeması",
            "hidrolik sistem şeması",
        ],
        ("tr", Category::Troubleshooting) => &[
            "arıza kodu listesi",
            "arıza teşhis kılavuzu",
            "hata kodu listesi",
        ],
        ("ru", Category::PartsCatalog) => &[
            "каталог запчастей",
            "каталог деталей запчастей",
        ],
        ("ru", Category::ServiceManual) => &[
            "руководство по ремонту",
            "инструкция по ремонту",
        ],
        ("ru", Category::ElectricalDiagram) => &[
            "электрическая схема",
            "схема электрическая принципиальная",
        ],
        ("ru", Category::HydraulicDiagram) => &[
            "гидравлическая схема",
            "схема гидравлическая принципиальная",
        ],
        ("ru", Category::Troubleshooting) => &[
            "коды неисправностей",
            "диагностика неисправностей",
        ],
        (_, Category::PartsCatalog) => &[
            "parts catalog",
            "parts catalogue",
            "illustrated parts catalog",
            "parts manual",
            "spare parts catalog",
            "parts book",
            "parts breakdown",
            "exploded parts diagram",
        ],
        (_, Category::ServiceManual) => &[
            "service manual",
            "workshop manual",
            "repair manual",
            "shop manual",
            "overhaul manual",
            "maintenance manual",
            "technical manual",
            "factory service manual",
        ],
        (_, Category::ElectricalDiagram) => &[
            "wiring diagram",
            "electrical schematic",
            "wire harness diagram",
            "circuit diagram",
            "electrical diagram",
            "electrical wiring diagram",
        ],
        (_, Category::HydraulicDiagram) => &[
            "hydraulic schematic",
            "hydraulic diagram",
            "hydraulic circuit diagram",
            "hydraulic system diagram",
            "hydraulic flow diagram",
        ],
        (_, Category::Troubleshooting) => &[
            "troubleshooting guide",
            "troubleshooting manual",
            "fault code list",
            "error code list",
            "diagnostic manual",
            "fault finding guide",
            "DTC codes",
        ],
    }
}

/// Unique optional words across every phrasing of the category, minus the
/// core keyword and the stoplist. Sorted for deterministic output.
pub fn variant_words(language: &str, category: Category) -> Vec<String> {
    let core = core_keyword(language, category);
    let mut words: Vec<String> = Vec::new();

    for phrase in phrasings(language, category) {
        for word in phrase.to_lowercase().split_whitespace() {
            if word != core && !STOP_WORDS.contains(&word) && !words.iter().any(|w| w == word) {
                words.push(word.to_string());
            }
        }
    }

    words.sort();
    words
}

/// Maps a language code to the one whose term tables will serve it.
pub fn supported(language: &str) -> &str {
    match language {
        "tr" | "ru" => language,
        _ => DEFAULT_LANGUAGE,
    }
}
