use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod backfill;
mod stores;

#[derive(Debug, Parser)]
#[command(name = "chollo-cli")]
#[command(about = "Chollo admin command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run pending database migrations
    Migrate,
    /// Upsert seed stores from the YAML seed table
    SeedStores {
        /// Seed file to load instead of the configured CHOLLO_STORES_PATH
        #[arg(long)]
        file: Option<PathBuf>,

        /// Preview what would be seeded without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Correct the display name of an existing store
    RenameStore {
        /// Canonical domain of the store to rename
        #[arg(long)]
        domain: String,

        /// New display name
        #[arg(long)]
        name: String,
    },
    /// Repair legacy deal rows: re-resolve stores stuck on the unknown
    /// sentinel and generate missing search keywords
    Backfill {
        /// Maximum number of rows to inspect
        #[arg(long, default_value_t = 500)]
        limit: i64,

        /// Maximum concurrent store resolutions
        #[arg(long, default_value_t = 8)]
        concurrency: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("chollo-cli: pass a subcommand (see --help)");
        return Ok(());
    };

    let config = chollo_core::config::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = chollo_db::PoolConfig::from_app_config(&config);
    let pool = chollo_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Migrate => {
            let applied = chollo_db::run_migrations(&pool).await?;
            println!("applied {applied} pending migrations");
        }
        Commands::SeedStores { file, dry_run } => {
            stores::run_seed(&pool, &config, file.as_deref(), dry_run).await?;
        }
        Commands::RenameStore { domain, name } => {
            stores::run_rename(&pool, &domain, &name).await?;
        }
        Commands::Backfill { limit, concurrency } => {
            backfill::run(&pool, &config, limit, concurrency).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
