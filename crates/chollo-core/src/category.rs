//! Deal categories: the canonical enum, legacy-label normalization, and the
//! keyword heuristic that guesses a category from free text.

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Canonical deal categories. Serialized values are the lower-case Spanish
/// labels stored on deal rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DealCategory {
    #[serde(rename = "electrónicos")]
    Electronicos,
    #[serde(rename = "moda")]
    Moda,
    #[serde(rename = "hogar")]
    Hogar,
    #[serde(rename = "belleza")]
    Belleza,
    #[serde(rename = "deportes")]
    Deportes,
    #[serde(rename = "libros")]
    Libros,
    #[serde(rename = "turismo")]
    Turismo,
    #[serde(rename = "juegos")]
    Juegos,
    #[serde(rename = "otros")]
    Otros,
}

impl DealCategory {
    pub const ALL: [DealCategory; 9] = [
        DealCategory::Electronicos,
        DealCategory::Moda,
        DealCategory::Hogar,
        DealCategory::Belleza,
        DealCategory::Deportes,
        DealCategory::Libros,
        DealCategory::Turismo,
        DealCategory::Juegos,
        DealCategory::Otros,
    ];

    /// The stored label, `electrónicos` and friends.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DealCategory::Electronicos => "electrónicos",
            DealCategory::Moda => "moda",
            DealCategory::Hogar => "hogar",
            DealCategory::Belleza => "belleza",
            DealCategory::Deportes => "deportes",
            DealCategory::Libros => "libros",
            DealCategory::Turismo => "turismo",
            DealCategory::Juegos => "juegos",
            DealCategory::Otros => "otros",
        }
    }

    /// Human-facing display name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            DealCategory::Electronicos => "Electrónicos",
            DealCategory::Moda => "Moda y Accesorios",
            DealCategory::Hogar => "Hogar y Jardín",
            DealCategory::Belleza => "Belleza y Cuidado Personal",
            DealCategory::Deportes => "Deportes y Fitness",
            DealCategory::Libros => "Libros y Educación",
            DealCategory::Turismo => "Turismo y Recreación",
            DealCategory::Juegos => "Juegos y Juguetes",
            DealCategory::Otros => "Otros",
        }
    }
}

impl std::fmt::Display for DealCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DealCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DealCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::InvalidCategory(s.to_string()))
    }
}

/// Legacy free-text labels that predate the category enum, folded to
/// canonical labels before grouping. Unmapped labels pass through unchanged
/// and form their own group.
const LEGACY_LABELS: [(&str, &str); 12] = [
    ("Tecnología", "electrónicos"),
    ("Hogar", "hogar"),
    ("Moda", "moda"),
    ("Deportes", "deportes"),
    ("Salud", "otros"),
    ("Automóviles", "otros"),
    ("Libros", "libros"),
    ("Juguetes", "otros"),
    ("Electrodomésticos", "electrónicos"),
    ("Oficina", "otros"),
    ("Belleza", "belleza"),
    ("Otros", "otros"),
];

/// Fold a stored category label into the canonical set where a legacy
/// mapping exists; otherwise return it unchanged.
#[must_use]
pub fn normalize_label(label: &str) -> &str {
    LEGACY_LABELS
        .iter()
        .find(|(legacy, _)| *legacy == label)
        .map_or(label, |(_, canonical)| canonical)
}

/// Keyword table for [`guess_category`]. First containment hit wins, checked
/// in declaration order.
const CATEGORY_KEYWORDS: [(DealCategory, &[&str]); 6] = [
    (
        DealCategory::Electronicos,
        &["celular", "smartphone", "laptop", "tablet"],
    ),
    (DealCategory::Moda, &["ropa", "zapatos", "vestido"]),
    (DealCategory::Hogar, &["casa", "cocina", "mueble"]),
    (DealCategory::Belleza, &["belleza", "perfume", "crema"]),
    (DealCategory::Deportes, &["deporte", "fitness", "gym"]),
    (DealCategory::Libros, &["libro", "curso", "educación"]),
];

/// Guess a category from free text (typically title + description) by
/// substring containment against a static keyword table. Deterministic; no
/// match means [`DealCategory::Otros`].
#[must_use]
pub fn guess_category(text: &str) -> DealCategory {
    let lower = text.to_lowercase();
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return category;
        }
    }
    DealCategory::Otros
}
