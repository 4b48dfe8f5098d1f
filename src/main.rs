use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use movie_catalog_api::{
    config::Config,
    db::{
        create_pool, create_redis_client, run_migrations, Cache, MemoryStore, PgCommentStore,
        PgFavoriteStore, PgTitleOverrideStore, PgWatchProgressStore,
    },
    routes::{create_router, AppState},
    services::catalog::phimapi::PhimApiClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movie_catalog_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let (cache, cache_handle) = match &config.redis_url {
        Some(redis_url) => {
            let client = create_redis_client(redis_url)?;
            tracing::info!("Catalog cache enabled");
            Cache::new(client)
        }
        None => {
            tracing::warn!("REDIS_URL not set, catalog responses will not be cached");
            Cache::disabled()
        }
    };

    let catalog = PhimApiClient::new(
        cache,
        config.catalog_api_url.clone(),
        config.catalog_cdn_url.clone(),
        Duration::from_secs(config.catalog_timeout_secs),
    )?;

    let state = match &config.database_url {
        Some(database_url) => {
            let pool = create_pool(database_url)
                .await
                .context("connecting to database")?;
            run_migrations(&pool).await?;

            AppState {
                overrides: Arc::new(PgTitleOverrideStore::new(pool.clone())),
                progress: Arc::new(PgWatchProgressStore::new(pool.clone())),
                favorites: Arc::new(PgFavoriteStore::new(pool.clone())),
                comments: Arc::new(PgCommentStore::new(pool)),
                catalog: Arc::new(catalog),
                hidden_scan_max_pages: config.hidden_scan_max_pages,
            }
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage; data is lost on restart");
            let store = MemoryStore::new();

            AppState {
                overrides: Arc::new(store.clone()),
                progress: Arc::new(store.clone()),
                favorites: Arc::new(store.clone()),
                comments: Arc::new(store),
                catalog: Arc::new(catalog),
                hidden_scan_max_pages: config.hidden_scan_max_pages,
            }
        }
    };

    let app = create_router(Arc::new(state));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {}", address))?;
    tracing::info!("Server running on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running API server")?;

    cache_handle.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
