use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tastebud_api::{
    api::{create_router, AppState},
    config::Config,
    db::{self, Cache, MemoryStore, PgStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tastebud_api=debug,tower_http=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let (cache, cache_handle) = match &config.redis_url {
        Some(redis_url) => {
            let client = db::create_redis_client(redis_url)?;
            let (cache, handle) = Cache::new(client).await;
            tracing::info!("Redis cache enabled");
            (Some(cache), Some(handle))
        }
        None => (None, None),
    };

    let state = match &config.database_url {
        Some(database_url) => {
            let pool = db::create_pool(database_url).await?;
            db::run_migrations(&pool).await?;
            tracing::info!("Connected to PostgreSQL");
            AppState::new(PgStore::new(pool), cache, config.clone())
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            AppState::new(MemoryStore::new(), cache, config.clone())
        }
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %config.bind_addr(), "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
