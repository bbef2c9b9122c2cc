//! URL → canonical registrable domain.
//!
//! Store identity is keyed on the registrable domain, so every purchase link
//! under the same merchant must collapse to one string regardless of
//! subdomain: `autos.mercadolibre.com.ar` and `mercadolibre.com.ar` are the
//! same store.

/// Generic TLDs for which a three-label hostname is assumed to carry a
/// subdomain (`shop.example.com` → `example.com`). Two-letter country TLDs
/// are deliberately absent: for those the full three labels are the
/// registrable domain (`shop.example.cl` stays as-is).
const GENERIC_TLDS: [&str; 9] = [
    "com", "org", "net", "edu", "gov", "mil", "int", "info", "biz",
];

/// Extract the canonical registrable domain from an absolute URL.
///
/// Lower-cases the hostname, strips a leading `www.`, then removes
/// subdomains:
/// - four or more labels: keep the last three when the final two labels are
///   both short (≤3 chars, the `.com.ar` / `.co.uk` pattern), otherwise the
///   last two;
/// - exactly three labels: keep the last two only when the final label is a
///   common generic TLD, otherwise all three;
/// - one or two labels: unchanged.
///
/// Unparseable input yields `""`; callers map that to the unknown store
/// rather than failing the submission.
#[must_use]
pub fn canonical_domain(url: &str) -> String {
    let Some(host) = hostname(url) else {
        return String::new();
    };

    let host = host.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    strip_subdomains(host)
}

fn strip_subdomains(host: &str) -> String {
    let labels: Vec<&str> = host.split('.').collect();

    if labels.len() >= 4 {
        let last = labels[labels.len() - 1];
        let second_last = labels[labels.len() - 2];
        let keep = if last.len() <= 3 && second_last.len() <= 3 {
            3
        } else {
            2
        };
        return labels[labels.len() - keep..].join(".");
    }

    if labels.len() == 3 {
        let tld = labels[2];
        if GENERIC_TLDS.contains(&tld) {
            return labels[1..].join(".");
        }
        return host.to_string();
    }

    host.to_string()
}

/// Pull the hostname out of an absolute URL, without a full URL parser.
///
/// Requires an alphabetic scheme followed by `://`. The authority section is
/// cut at the first of `/`, `?` or `#`; userinfo and port are dropped.
/// Returns `None` for anything that does not look like an absolute URL or
/// whose host contains whitespace.
fn hostname(url: &str) -> Option<&str> {
    let url = url.trim();
    let scheme_end = url.find("://")?;
    let scheme = &url[..scheme_end];
    if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let rest = &url[scheme_end + 3..];
    let authority_end = rest
        .find(['/', '?', '#'])
        .unwrap_or(rest.len());
    let authority = &rest[..authority_end];

    // Drop userinfo, then the port.
    let host = authority
        .rsplit_once('@')
        .map_or(authority, |(_, host)| host);
    let host = host.split(':').next().unwrap_or(host);

    if host.is_empty() || host.chars().any(char::is_whitespace) {
        return None;
    }

    Some(host)
}
