//! Legacy-row repair: deals still pointing at the unknown store sentinel get
//! their store re-resolved from the purchase link, and deals with no search
//! keywords get them generated from title, description and category.
//!
//! Per-deal failures are logged and skipped rather than propagated so a
//! single bad row does not abort the run.

use futures::stream::{self, StreamExt};
use sqlx::PgPool;

use chollo_core::domain::canonical_domain;
use chollo_core::keywords::generate_search_keywords;
use chollo_core::store::{synthesize_store, StoreSeeds};
use chollo_db::RepairCandidateRow;
use chollo_scraper::FaviconClient;

/// Outcome of repairing a single deal: how many store links and keyword sets
/// were written. `Err` wraps unexpected per-deal errors.
enum DealOutcome {
    Ok { stores: i32, keywords: i32 },
    Err(anyhow::Error),
}

/// Run a repair pass over up to `limit` candidate rows with at most
/// `concurrency` store resolutions in flight.
///
/// # Errors
///
/// Returns an error if the candidate query fails, the seed table cannot be
/// loaded, the favicon client cannot be constructed, or every candidate
/// fails repair.
pub(crate) async fn run(
    pool: &PgPool,
    config: &chollo_core::AppConfig,
    limit: i64,
    concurrency: usize,
) -> anyhow::Result<()> {
    let candidates = chollo_db::list_repair_candidates(pool, limit).await?;
    if candidates.is_empty() {
        println!("no deals need repair");
        return Ok(());
    }

    let seeds = chollo_core::store::load_store_seeds(&config.stores_path)?;
    let favicon = FaviconClient::new(&config.favicon_base_url, config.scrape_timeout_secs)?;

    let max_concurrent = concurrency.max(1);

    let results: Vec<(&RepairCandidateRow, DealOutcome)> = stream::iter(&candidates)
        .map(|c| {
            let fut = repair_deal(pool, &seeds, &favicon, c);
            async move { (c, fut.await) }
        })
        .buffer_unordered(max_concurrent)
        .collect()
        .await;

    let mut stores_fixed: i32 = 0;
    let mut keywords_fixed: i32 = 0;
    let mut failed_deals: usize = 0;
    let candidate_count = candidates.len();

    for (c, outcome) in &results {
        match outcome {
            DealOutcome::Ok { stores, keywords } => {
                stores_fixed = stores_fixed.saturating_add(*stores);
                keywords_fixed = keywords_fixed.saturating_add(*keywords);
            }
            DealOutcome::Err(e) => {
                tracing::error!(deal = %c.id, error = %e, "unexpected error repairing deal");
                failed_deals += 1;
            }
        }
    }

    if failed_deals > 0 {
        tracing::warn!(
            failed_deals,
            total_deals = candidate_count,
            "some deals failed during repair"
        );
    }

    if failed_deals == candidate_count {
        anyhow::bail!("all {failed_deals} deals failed repair");
    }

    println!(
        "repaired {stores_fixed} store links and {keywords_fixed} keyword sets across {candidate_count} deals"
    );
    Ok(())
}

async fn repair_deal(
    pool: &PgPool,
    seeds: &StoreSeeds,
    favicon: &FaviconClient,
    candidate: &RepairCandidateRow,
) -> DealOutcome {
    match try_repair(pool, seeds, favicon, candidate).await {
        Ok((stores, keywords)) => DealOutcome::Ok { stores, keywords },
        Err(e) => DealOutcome::Err(e),
    }
}

/// Repair one deal, returning `(stores_written, keywords_written)`.
///
/// Store resolution mirrors the server's first-encounter path: an existing
/// row for the canonical domain is reused as stored, a new domain gets a
/// favicon lookup and is synthesized from seeds and persisted. Links that do
/// not canonicalize stay on the sentinel.
async fn try_repair(
    pool: &PgPool,
    seeds: &StoreSeeds,
    favicon: &FaviconClient,
    candidate: &RepairCandidateRow,
) -> anyhow::Result<(i32, i32)> {
    let mut stores: i32 = 0;
    let mut keywords: i32 = 0;

    if candidate.needs_store() {
        let domain = canonical_domain(&candidate.purchase_link);
        if !domain.is_empty() {
            let store = match chollo_db::get_store(pool, &domain).await? {
                Some(row) => row.into_store(),
                None => {
                    let icon_url = favicon.resolve(&domain).await;
                    let synthesized = synthesize_store(seeds, &domain, icon_url.as_deref(), None);
                    chollo_db::upsert_store(pool, &synthesized).await?.into_store()
                }
            };
            if chollo_db::assign_store(pool, candidate.id, &store.id).await? {
                stores += 1;
            }
        }
    }

    if candidate.needs_keywords() {
        let generated = generate_search_keywords(
            &candidate.title,
            &candidate.description,
            &candidate.category,
        );
        if !generated.is_empty()
            && chollo_db::set_search_keywords(pool, candidate.id, &generated).await?
        {
            keywords += 1;
        }
    }

    Ok((stores, keywords))
}

#[cfg(test)]
#[path = "backfill_test.rs"]
mod tests;
