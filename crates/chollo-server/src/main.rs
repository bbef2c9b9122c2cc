mod api;
mod directory;
mod middleware;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::{AuthState, RateLimitState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(chollo_core::config::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = chollo_db::PoolConfig::from_app_config(&config);
    let pool = chollo_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = chollo_db::run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "applied pending migrations");
    }

    let seeds = Arc::new(chollo_core::store::load_store_seeds(&config.stores_path)?);
    let seeded = chollo_db::seed_stores(&pool, &seeds).await?;
    tracing::info!(seeded, "store seed table upserted");

    let metadata = Arc::new(chollo_scraper::MetadataClient::new(
        &config.scrape_base_url,
        config.scrape_timeout_secs,
    )?);
    let favicon = Arc::new(chollo_scraper::FaviconClient::new(
        &config.favicon_base_url,
        config.scrape_timeout_secs,
    )?);

    let auth = AuthState::from_config(
        &config.api_keys,
        matches!(config.env, chollo_core::Environment::Development),
    )?;
    let rate_limit = RateLimitState::new(
        config.rate_limit_max_requests,
        Duration::from_secs(config.rate_limit_window_secs),
    );

    let app = build_app(
        AppState {
            pool,
            config: Arc::clone(&config),
            seeds,
            metadata,
            favicon,
        },
        auth,
        rate_limit,
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
