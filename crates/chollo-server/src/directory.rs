//! Store directory composition: purchase link → canonical domain → stored
//! record, synthesizing and persisting a new one on first encounter.

use chollo_core::domain::canonical_domain;
use chollo_core::store::{synthesize_store, Store, StoreHints};

use crate::api::AppState;

/// Resolves the store for a purchase link.
///
/// Unparseable links map to the unknown sentinel (already present in the
/// database). A known domain is returned as stored; a new domain gets a
/// favicon lookup (skipped when scraped hints already carry a logo), is
/// synthesized from seeds/hints/domain, persisted, and returned. Two
/// concurrent first encounters race benignly: the upsert is last-write-wins
/// over identical synthesis.
///
/// # Errors
///
/// Returns [`chollo_db::DbError`] if the lookup or insert fails.
pub async fn get_or_create_store(
    state: &AppState,
    purchase_link: &str,
    hints: Option<&StoreHints>,
) -> Result<Store, chollo_db::DbError> {
    let domain = canonical_domain(purchase_link);
    if domain.is_empty() {
        return Ok(Store::unknown());
    }

    if let Some(row) = chollo_db::get_store(&state.pool, &domain).await? {
        return Ok(row.into_store());
    }

    let icon_url = match hints.and_then(|h| h.logo_url.clone()) {
        Some(logo) => Some(logo),
        None => state.favicon.resolve(&domain).await,
    };

    let store = synthesize_store(&state.seeds, &domain, icon_url.as_deref(), hints);
    let row = chollo_db::upsert_store(&state.pool, &store).await?;

    Ok(row.into_store())
}
