//! Store identity: the `Store` record, the seed table, and the synthesis
//! chain that turns a purchase-link domain into a presentable store.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::canonical_domain;
use crate::ConfigError;

/// Canonical merchant identity derived from a purchase-link domain.
///
/// `id` equals the canonical domain, except for the unknown sentinel.
/// `icon` is either an emoji or an image URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub domain: String,
    pub color: String,
}

impl Store {
    /// Sentinel store for unparseable or unknown purchase links.
    #[must_use]
    pub fn unknown() -> Self {
        Store {
            id: "unknown".to_string(),
            name: "Sitio Web".to_string(),
            icon: "🌐".to_string(),
            domain: String::new(),
            color: "#9E9E9E".to_string(),
        }
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.id == "unknown"
    }
}

/// Fixed palette for stores without a seeded colour.
pub const PALETTE: [&str; 10] = [
    "#3B82F6", "#EF4444", "#10B981", "#F59E0B", "#8B5CF6", "#06B6D4",
    "#F97316", "#84CC16", "#EC4899", "#6366F1",
];

/// Seeded defaults for a well-known store domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSeed {
    pub name: String,
    pub icon: String,
    pub color: String,
}

/// The seed table, keyed by canonical domain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSeeds {
    pub stores: BTreeMap<String, StoreSeed>,
}

impl StoreSeeds {
    #[must_use]
    pub fn get(&self, domain: &str) -> Option<&StoreSeed> {
        self.stores.get(domain)
    }
}

/// Load and validate the store seed table from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation (malformed domain keys, empty names, non-hex colours).
pub fn load_store_seeds(path: &Path) -> Result<StoreSeeds, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SeedFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let seeds: StoreSeeds = serde_yaml::from_str(&content)?;
    validate_seeds(&seeds)?;

    Ok(seeds)
}

fn validate_seeds(seeds: &StoreSeeds) -> Result<(), ConfigError> {
    for (domain, seed) in &seeds.stores {
        if domain.trim().is_empty()
            || domain.contains('/')
            || domain.contains("://")
            || *domain != domain.to_lowercase()
        {
            return Err(ConfigError::Validation(format!(
                "seed key '{domain}' is not a bare lower-case domain"
            )));
        }

        if seed.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "seed for '{domain}' has an empty name"
            )));
        }

        if seed.icon.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "seed for '{domain}' has an empty icon"
            )));
        }

        if !is_hex_color(&seed.color) {
            return Err(ConfigError::Validation(format!(
                "seed for '{domain}' has colour '{}'; expected #RRGGBB",
                seed.color
            )));
        }
    }

    Ok(())
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7
        && s.starts_with('#')
        && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Scraped page fields that inform store synthesis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreHints {
    pub publisher: Option<String>,
    pub title: Option<String>,
    pub logo_url: Option<String>,
}

/// Synthesize the store for an already-canonicalized domain.
///
/// Precedence: name from the seed table, else scraped hints, else the domain
/// itself; icon from the provided icon URL (scraped logo or resolved
/// favicon), else the seed emoji, else the globe; colour from the seed
/// table, else a deterministic palette pick so repeated synthesis of the
/// same domain always agrees.
#[must_use]
pub fn synthesize_store(
    seeds: &StoreSeeds,
    domain: &str,
    icon_url: Option<&str>,
    hints: Option<&StoreHints>,
) -> Store {
    let seed = seeds.get(domain);

    let name = seed
        .map(|s| s.name.clone())
        .or_else(|| hints.and_then(|h| name_from_hints(domain, h)))
        .unwrap_or_else(|| name_from_domain(domain));

    let icon = icon_url
        .map(ToOwned::to_owned)
        .or_else(|| seed.map(|s| s.icon.clone()))
        .unwrap_or_else(|| "🌐".to_string());

    let color = seed
        .map(|s| s.color.clone())
        .unwrap_or_else(|| pick_color(domain).to_string());

    Store {
        id: domain.to_string(),
        name,
        icon,
        domain: domain.to_string(),
        color,
    }
}

/// Pure synthesis from a purchase link, for immediate feedback before any
/// lookup or persistence. Invalid links yield the unknown sentinel.
#[must_use]
pub fn preview_store(seeds: &StoreSeeds, purchase_link: &str, favicon: Option<&str>) -> Store {
    let domain = canonical_domain(purchase_link);
    if domain.is_empty() {
        return Store::unknown();
    }
    synthesize_store(seeds, &domain, favicon, None)
}

/// Deterministic palette pick: a byte fold over the domain, so the sync
/// preview and the persisted record land on the same colour.
#[must_use]
pub fn pick_color(domain: &str) -> &'static str {
    let fold = domain
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
    PALETTE[fold % PALETTE.len()]
}

/// Derive a store name from scraped page fields: the publisher when it is
/// not just the domain repeated, else a title that looks like a site name
/// (contains a marketplace word or is three words or fewer).
fn name_from_hints(domain: &str, hints: &StoreHints) -> Option<String> {
    if let Some(publisher) = hints.publisher.as_deref() {
        if !publisher.trim().is_empty() && publisher != domain {
            return Some(clean_store_name(publisher));
        }
    }

    let title = hints.title.as_deref()?.trim();
    if title.is_empty() {
        return None;
    }
    let lower = title.to_lowercase();
    let site_markers = ["amazon", "mercado", "ebay", "tienda", "shop", "store"];
    if site_markers.iter().any(|m| lower.contains(m)) || title.split_whitespace().count() <= 3 {
        return Some(clean_store_name(title));
    }

    None
}

/// Strip marketing suffixes from a scraped store name and title-case it.
///
/// Removes a trailing `- Tienda/Shop/Store/Online/Oficial/Official …`, a
/// leading `Tienda/Shop/Store`, and everything after `|`, `·` or the first
/// period.
#[must_use]
pub fn clean_store_name(name: &str) -> String {
    let mut cleaned = name.trim();

    for sep in ['|', '·', '.'] {
        if let Some(idx) = cleaned.find(sep) {
            cleaned = cleaned[..idx].trim_end();
        }
    }

    for marker in ["- tienda", "- shop", "- store", "- online", "- oficial", "- official"] {
        if let Some(idx) = find_ascii_ci(cleaned, marker) {
            cleaned = cleaned[..idx].trim_end();
            break;
        }
    }

    for prefix in ["tienda ", "shop ", "store "] {
        if find_ascii_ci(cleaned, prefix) == Some(0) {
            cleaned = cleaned[prefix.len()..].trim_start();
            break;
        }
    }

    title_case(cleaned)
}

/// Byte index of the first ASCII-case-insensitive occurrence of `needle`.
/// Needles are pure ASCII, so a hit always lands on a char boundary.
fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Generic TLD labels stripped when deriving a name from a bare domain.
const NAME_GENERIC_TLDS: [&str; 12] = [
    "com", "net", "org", "edu", "gov", "mil", "int", "info", "biz", "name",
    "pro", "travel",
];

/// Country TLD labels stripped when deriving a name from a bare domain.
const NAME_COUNTRY_TLDS: [&str; 40] = [
    "ar", "cl", "mx", "br", "co", "pe", "ec", "py", "uy", "bo", "ve", "gt",
    "ni", "pa", "sv", "hn", "cr", "do", "cu", "us", "ca", "uk", "de", "fr",
    "it", "es", "pt", "nl", "be", "ch", "at", "se", "no", "dk", "fi", "ie",
    "pl", "cz", "hu", "ro",
];

/// Mechanical fallback name: drop trailing TLD labels, capitalize the first
/// remaining label. `shop.example.cl` → `Shop`; `example.com.ar` → `Example`.
#[must_use]
pub fn name_from_domain(domain: &str) -> String {
    let mut labels: Vec<&str> = domain.split('.').filter(|l| !l.is_empty()).collect();

    while labels.len() > 1 {
        let last = labels[labels.len() - 1];
        if NAME_GENERIC_TLDS.contains(&last) || NAME_COUNTRY_TLDS.contains(&last) {
            labels.pop();
        } else {
            break;
        }
    }

    let Some(first) = labels.first() else {
        return String::new();
    };

    let mut chars = first.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
