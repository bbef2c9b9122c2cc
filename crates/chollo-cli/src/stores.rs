//! Store directory admin commands: seeding from YAML and name correction.

use std::path::Path;

use sqlx::PgPool;

/// Upsert seed stores from the YAML seed table.
///
/// With `--dry-run` the function prints what would be seeded and returns
/// without touching the database.
///
/// # Errors
///
/// Returns an error if the seed file cannot be loaded or validated, or if
/// the upsert batch fails.
pub(crate) async fn run_seed(
    pool: &PgPool,
    config: &chollo_core::AppConfig,
    file: Option<&Path>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let path = file.unwrap_or(config.stores_path.as_path());
    let seeds = chollo_core::store::load_store_seeds(path)?;

    if seeds.stores.is_empty() {
        println!("seed file {} contains no stores; nothing to do", path.display());
        return Ok(());
    }

    if dry_run {
        let domains: Vec<&str> = seeds.stores.keys().map(String::as_str).collect();
        println!(
            "dry-run: would upsert {} stores: [{}]",
            domains.len(),
            domains.join(", ")
        );
        return Ok(());
    }

    let seeded = chollo_db::seed_stores(pool, &seeds).await?;
    println!("upserted {seeded} seed stores from {}", path.display());
    Ok(())
}

/// Admin name correction for an existing store.
///
/// # Errors
///
/// Returns an error if the name is blank, the store does not exist, or the
/// update fails.
pub(crate) async fn run_rename(pool: &PgPool, domain: &str, name: &str) -> anyhow::Result<()> {
    let domain = domain.trim().to_lowercase();
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("store name must not be empty");
    }

    if chollo_db::rename_store(pool, &domain, name).await? {
        println!("renamed store '{domain}' to '{name}'");
        Ok(())
    } else {
        anyhow::bail!("store '{domain}' not found; check the domain or seed it first")
    }
}
