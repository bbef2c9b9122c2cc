//! Database operations for the `stores` table.

use chrono::{DateTime, Utc};
use chollo_core::Store;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `stores` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoreRow {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub domain: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoreRow {
    #[must_use]
    pub fn into_store(self) -> Store {
        Store {
            id: self.id,
            name: self.name,
            icon: self.icon,
            domain: self.domain,
            color: self.color,
        }
    }
}

/// Returns the store for a canonical domain id, or `None` if not persisted yet.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_store(pool: &PgPool, id: &str) -> Result<Option<StoreRow>, DbError> {
    let row = sqlx::query_as::<_, StoreRow>(
        "SELECT id, name, icon, domain, color, created_at, updated_at \
         FROM stores \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the full store directory ordered by name, sentinel excluded.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_stores(pool: &PgPool) -> Result<Vec<StoreRow>, DbError> {
    let rows = sqlx::query_as::<_, StoreRow>(
        "SELECT id, name, icon, domain, color, created_at, updated_at \
         FROM stores \
         WHERE id <> 'unknown' \
         ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Upserts a store keyed by its canonical domain id.
///
/// Conflicts overwrite name, icon, domain and colour in place. Concurrent
/// creators for the same new domain both write the same id, so
/// last-write-wins is a benign race rather than a uniqueness violation.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_store(pool: &PgPool, store: &Store) -> Result<StoreRow, DbError> {
    let row = sqlx::query_as::<_, StoreRow>(
        "INSERT INTO stores (id, name, icon, domain, color) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (id) DO UPDATE SET \
             name       = EXCLUDED.name, \
             icon       = EXCLUDED.icon, \
             domain     = EXCLUDED.domain, \
             color      = EXCLUDED.color, \
             updated_at = NOW() \
         RETURNING id, name, icon, domain, color, created_at, updated_at",
    )
    .bind(&store.id)
    .bind(&store.name)
    .bind(&store.icon)
    .bind(&store.domain)
    .bind(&store.color)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Admin name correction for an existing store. Returns `false` when no store
/// with that domain exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn rename_store(pool: &PgPool, id: &str, name: &str) -> Result<bool, DbError> {
    let affected = sqlx::query(
        "UPDATE stores \
         SET name = $2, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(name)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> Store {
        Store {
            id: "example.com".to_string(),
            name: "Example".to_string(),
            icon: "🌐".to_string(),
            domain: "example.com".to_string(),
            color: "#3B82F6".to_string(),
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn sentinel_store_exists_after_migrations(pool: PgPool) {
        let row = get_store(&pool, "unknown")
            .await
            .expect("query")
            .expect("sentinel row");
        assert_eq!(row.name, "Sitio Web");
        assert_eq!(row.domain, "");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn upsert_is_last_write_wins(pool: PgPool) {
        let first = sample_store();
        upsert_store(&pool, &first).await.expect("first upsert");

        let mut second = sample_store();
        second.name = "Example Renamed".to_string();
        let row = upsert_store(&pool, &second).await.expect("second upsert");
        assert_eq!(row.name, "Example Renamed");

        let fetched = get_store(&pool, "example.com")
            .await
            .expect("query")
            .expect("row");
        assert_eq!(fetched.name, "Example Renamed");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn list_excludes_sentinel_and_orders_by_name(pool: PgPool) {
        let mut b = sample_store();
        b.id = "bravo.com".to_string();
        b.name = "Bravo".to_string();
        let mut a = sample_store();
        a.id = "alfa.com".to_string();
        a.name = "Alfa".to_string();
        upsert_store(&pool, &b).await.expect("upsert b");
        upsert_store(&pool, &a).await.expect("upsert a");

        let names: Vec<String> = list_stores(&pool)
            .await
            .expect("list")
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Alfa", "Bravo"]);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn rename_reports_missing_store(pool: PgPool) {
        assert!(!rename_store(&pool, "nope.com", "Nope").await.expect("rename"));

        upsert_store(&pool, &sample_store()).await.expect("upsert");
        assert!(rename_store(&pool, "example.com", "Ejemplo")
            .await
            .expect("rename"));
        let row = get_store(&pool, "example.com")
            .await
            .expect("query")
            .expect("row");
        assert_eq!(row.name, "Ejemplo");
    }
}
