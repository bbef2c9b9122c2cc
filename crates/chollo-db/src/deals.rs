//! Database operations for the `deals` table.
//!
//! Every read joins the owning store row so callers get a complete
//! [`chollo_core::Deal`] in one round-trip.

use chollo_core::{Deal, Store};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A `deals` row joined with its `stores` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DealRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub previous_price: Option<Decimal>,
    pub current_price: Decimal,
    pub discount_percentage: Option<i32>,
    pub category: String,
    pub purchase_link: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub created_by_name: String,
    pub upvotes: i32,
    pub downvotes: i32,
    pub unavailable_reports: i32,
    pub views: i32,
    pub search_keywords: Vec<String>,
    pub store_id: String,
    pub store_name: String,
    pub store_icon: String,
    pub store_domain: String,
    pub store_color: String,
}

impl DealRow {
    #[must_use]
    pub fn into_deal(self) -> Deal {
        Deal {
            id: self.id,
            title: self.title,
            description: self.description,
            previous_price: self.previous_price,
            current_price: self.current_price,
            discount_percentage: self.discount_percentage,
            category: self.category,
            purchase_link: self.purchase_link,
            image_url: self.image_url,
            created_at: self.created_at,
            created_by: self.created_by,
            created_by_name: self.created_by_name,
            store: Store {
                id: self.store_id,
                name: self.store_name,
                icon: self.store_icon,
                domain: self.store_domain,
                color: self.store_color,
            },
            upvotes: self.upvotes,
            downvotes: self.downvotes,
            unavailable_reports: self.unavailable_reports,
            views: self.views,
        }
    }
}

const DEAL_COLUMNS: &str = "d.id, d.title, d.description, d.previous_price, d.current_price, \
     d.discount_percentage, d.category, d.purchase_link, d.image_url, \
     d.created_at, d.created_by, d.created_by_name, d.upvotes, d.downvotes, \
     d.unavailable_reports, d.views, d.search_keywords, \
     s.id AS store_id, s.name AS store_name, s.icon AS store_icon, \
     s.domain AS store_domain, s.color AS store_color";

// ---------------------------------------------------------------------------
// Create / read
// ---------------------------------------------------------------------------

/// Fields for a new deal row. The caller has already resolved the store,
/// parsed prices, derived the discount and generated search keywords.
#[derive(Debug, Clone)]
pub struct NewDeal {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub previous_price: Option<Decimal>,
    pub current_price: Decimal,
    pub discount_percentage: Option<i32>,
    pub category: String,
    pub purchase_link: String,
    pub image_url: Option<String>,
    pub created_by: String,
    pub created_by_name: String,
    pub store_id: String,
    pub search_keywords: Vec<String>,
}

/// Inserts a deal and returns the full row joined with its store.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a foreign-key
/// violation when `store_id` does not exist).
pub async fn create_deal(pool: &PgPool, new: &NewDeal) -> Result<DealRow, DbError> {
    let sql = format!(
        "WITH d AS ( \
             INSERT INTO deals \
                 (id, title, description, previous_price, current_price, \
                  discount_percentage, category, purchase_link, image_url, \
                  created_by, created_by_name, store_id, search_keywords) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING * \
         ) \
         SELECT {DEAL_COLUMNS} FROM d JOIN stores s ON s.id = d.store_id"
    );

    let row = sqlx::query_as::<_, DealRow>(&sql)
        .bind(new.id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.previous_price)
        .bind(new.current_price)
        .bind(new.discount_percentage)
        .bind(&new.category)
        .bind(&new.purchase_link)
        .bind(&new.image_url)
        .bind(&new.created_by)
        .bind(&new.created_by_name)
        .bind(&new.store_id)
        .bind(&new.search_keywords)
        .fetch_one(pool)
        .await?;

    Ok(row)
}

/// Returns a single deal with its store, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_deal(pool: &PgPool, id: Uuid) -> Result<Option<DealRow>, DbError> {
    let sql = format!(
        "SELECT {DEAL_COLUMNS} FROM deals d JOIN stores s ON s.id = d.store_id WHERE d.id = $1"
    );

    let row = sqlx::query_as::<_, DealRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Listing order for [`list_deals`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DealSort {
    #[default]
    Created,
    Views,
}

/// Keyset pagination cursor over `(created_at, id)` descending.
///
/// Encoded as `<unix-micros>_<uuid>`; opaque to clients. Only meaningful for
/// [`DealSort::Created`] listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DealCursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl DealCursor {
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{}_{}", self.created_at.timestamp_micros(), self.id)
    }

    /// Decodes a cursor token; `None` for anything malformed.
    #[must_use]
    pub fn decode(raw: &str) -> Option<Self> {
        let (micros, id) = raw.split_once('_')?;
        let created_at = DateTime::from_timestamp_micros(micros.parse().ok()?)?;
        Some(Self {
            created_at,
            id: id.parse().ok()?,
        })
    }

    #[must_use]
    pub fn from_row(row: &DealRow) -> Self {
        Self {
            created_at: row.created_at,
            id: row.id,
        }
    }
}

/// Filters for [`list_deals`]. `search` matches by substring over title,
/// description, category and author name, and by exact membership against the
/// generated keyword array (the normalized form of the query).
#[derive(Debug, Clone, Default)]
pub struct DealListFilters<'a> {
    pub created_since: Option<DateTime<Utc>>,
    pub category: Option<&'a str>,
    pub created_by: Option<&'a str>,
    pub search: Option<&'a str>,
    pub sort: DealSort,
    pub limit: i64,
    pub cursor: Option<DealCursor>,
}

/// Lists deals with their stores, newest first (or by views for
/// [`DealSort::Views`], which ignores the cursor).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_deals(
    pool: &PgPool,
    filters: DealListFilters<'_>,
) -> Result<Vec<DealRow>, DbError> {
    let order = match filters.sort {
        DealSort::Created => "d.created_at DESC, d.id DESC",
        DealSort::Views => "d.views DESC, d.created_at DESC, d.id DESC",
    };
    let sql = format!(
        "SELECT {DEAL_COLUMNS} \
         FROM deals d JOIN stores s ON s.id = d.store_id \
         WHERE ($1::timestamptz IS NULL OR d.created_at >= $1) \
           AND ($2::text IS NULL OR d.category = $2) \
           AND ($3::text IS NULL OR d.created_by = $3) \
           AND ($4::text IS NULL \
                OR d.title ILIKE '%' || $4 || '%' \
                OR d.description ILIKE '%' || $4 || '%' \
                OR d.category ILIKE '%' || $4 || '%' \
                OR d.created_by_name ILIKE '%' || $4 || '%' \
                OR $5::text = ANY(d.search_keywords)) \
           AND ($6::timestamptz IS NULL OR (d.created_at, d.id) < ($6, $7)) \
         ORDER BY {order} \
         LIMIT $8"
    );

    // Keyword arrays hold accent-folded lower-case tokens; normalize the
    // query the same way for the membership check.
    let normalized_search = filters
        .search
        .map(|q| chollo_core::keywords::normalize(q).trim().to_string());

    let cursor = match filters.sort {
        DealSort::Created => filters.cursor,
        DealSort::Views => None,
    };

    let rows = sqlx::query_as::<_, DealRow>(&sql)
        .bind(filters.created_since)
        .bind(filters.category)
        .bind(filters.created_by)
        .bind(filters.search)
        .bind(normalized_search)
        .bind(cursor.map(|c| c.created_at))
        .bind(cursor.map(|c| c.id))
        .bind(filters.limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Update / delete / views
// ---------------------------------------------------------------------------

/// Partial update for a deal. `None` keeps the current value; for nullable
/// columns `Some(None)` clears it and `Some(Some(v))` sets it.
#[derive(Debug, Clone, Default)]
pub struct DealPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub previous_price: Option<Option<Decimal>>,
    pub current_price: Option<Decimal>,
    pub discount_percentage: Option<Option<i32>>,
    pub category: Option<String>,
    pub purchase_link: Option<String>,
    pub image_url: Option<Option<String>>,
    pub store_id: Option<String>,
    pub search_keywords: Option<Vec<String>>,
}

/// Applies a partial update and returns the new row, or `None` if the deal
/// does not exist. Ownership is the caller's concern.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_deal(
    pool: &PgPool,
    id: Uuid,
    patch: &DealPatch,
) -> Result<Option<DealRow>, DbError> {
    // Nullable columns need a supplied flag to distinguish "keep" from
    // "clear"; COALESCE covers the non-nullable ones.
    let prev_price_supplied = patch.previous_price.is_some();
    let prev_price_val = patch.previous_price.flatten();
    let discount_supplied = patch.discount_percentage.is_some();
    let discount_val = patch.discount_percentage.flatten();
    let image_supplied = patch.image_url.is_some();
    let image_val = patch.image_url.clone().flatten();

    let sql = format!(
        "WITH d AS ( \
             UPDATE deals \
             SET title               = COALESCE($2, title), \
                 description         = COALESCE($3, description), \
                 previous_price      = CASE WHEN $4::BOOL THEN $5 ELSE previous_price END, \
                 current_price       = COALESCE($6, current_price), \
                 discount_percentage = CASE WHEN $7::BOOL THEN $8 ELSE discount_percentage END, \
                 category            = COALESCE($9, category), \
                 purchase_link       = COALESCE($10, purchase_link), \
                 image_url           = CASE WHEN $11::BOOL THEN $12 ELSE image_url END, \
                 store_id            = COALESCE($13, store_id), \
                 search_keywords     = COALESCE($14, search_keywords) \
             WHERE id = $1 \
             RETURNING * \
         ) \
         SELECT {DEAL_COLUMNS} FROM d JOIN stores s ON s.id = d.store_id"
    );

    let row = sqlx::query_as::<_, DealRow>(&sql)
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(prev_price_supplied)
        .bind(prev_price_val)
        .bind(patch.current_price)
        .bind(discount_supplied)
        .bind(discount_val)
        .bind(&patch.category)
        .bind(&patch.purchase_link)
        .bind(image_supplied)
        .bind(image_val)
        .bind(&patch.store_id)
        .bind(&patch.search_keywords)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Hard-deletes a deal; interactions follow via `ON DELETE CASCADE`.
/// Returns `false` when no row matched.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_deal(pool: &PgPool, id: Uuid) -> Result<bool, DbError> {
    let affected = sqlx::query("DELETE FROM deals WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(affected > 0)
}

/// Increments the view counter and returns the new count, or `None` if the
/// deal does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn increment_views(pool: &PgPool, id: Uuid) -> Result<Option<i32>, DbError> {
    let views = sqlx::query_scalar::<_, i32>(
        "UPDATE deals SET views = views + 1 WHERE id = $1 RETURNING views",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(views)
}

#[cfg(test)]
#[path = "deals_test.rs"]
mod tests;
