//! Repair queries for legacy deal rows, used by the CLI backfill command.

use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A deal row that may need repair: still pointing at the unknown store
/// despite having a purchase link, or carrying no search keywords.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RepairCandidateRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub purchase_link: String,
    pub store_id: String,
    pub search_keywords: Vec<String>,
}

impl RepairCandidateRow {
    #[must_use]
    pub fn needs_store(&self) -> bool {
        self.store_id == "unknown" && !self.purchase_link.trim().is_empty()
    }

    #[must_use]
    pub fn needs_keywords(&self) -> bool {
        self.search_keywords.is_empty()
    }
}

/// Returns deals needing repair, oldest first, capped at `limit`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_repair_candidates(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<RepairCandidateRow>, DbError> {
    let rows = sqlx::query_as::<_, RepairCandidateRow>(
        "SELECT id, title, description, category, purchase_link, store_id, search_keywords \
         FROM deals \
         WHERE (store_id = 'unknown' AND TRIM(purchase_link) <> '') \
            OR search_keywords = '{}' \
         ORDER BY created_at ASC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Points a deal at a different store row. Returns `false` when the deal no
/// longer exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails (including a foreign-key
/// violation when `store_id` does not exist).
pub async fn assign_store(pool: &PgPool, deal_id: Uuid, store_id: &str) -> Result<bool, DbError> {
    let affected = sqlx::query(
        "UPDATE deals \
         SET store_id = $2 \
         WHERE id = $1",
    )
    .bind(deal_id)
    .bind(store_id)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected > 0)
}

/// Replaces a deal's search keywords. Returns `false` when the deal no
/// longer exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn set_search_keywords(
    pool: &PgPool,
    deal_id: Uuid,
    keywords: &[String],
) -> Result<bool, DbError> {
    let affected = sqlx::query(
        "UPDATE deals \
         SET search_keywords = $2 \
         WHERE id = $1",
    )
    .bind(deal_id)
    .bind(keywords)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected > 0)
}

#[cfg(test)]
#[path = "maintenance_test.rs"]
mod tests;
