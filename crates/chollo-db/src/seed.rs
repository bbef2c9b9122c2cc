//! Seeding the store directory from the YAML seed table.

use chollo_core::store::StoreSeeds;
use sqlx::PgPool;

use crate::DbError;

/// Upsert seed stores into the database.
///
/// Returns the number of stores processed. All upserts run inside a single
/// transaction; if any operation fails the entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_stores(pool: &PgPool, seeds: &StoreSeeds) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for (domain, seed) in &seeds.stores {
        sqlx::query(
            "INSERT INTO stores (id, name, icon, domain, color) \
             VALUES ($1, $2, $3, $1, $4) \
             ON CONFLICT (id) DO UPDATE SET \
                 name       = EXCLUDED.name, \
                 icon       = EXCLUDED.icon, \
                 color      = EXCLUDED.color, \
                 updated_at = NOW()",
        )
        .bind(domain)
        .bind(&seed.name)
        .bind(&seed.icon)
        .bind(&seed.color)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}
