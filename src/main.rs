use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use newsmart::{
    config::Config,
    create_router,
    db::{create_pool, create_redis_client, Cache, MemoryStore, PgStore, Store},
    services::{
        http::ApiSession,
        providers::{CachedNewsSource, NewsApiProvider, NewsSource, WatsonNluProvider},
        url_check::HttpUrlChecker,
    },
    AppState, PipelineSettings,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsmart=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = if config.uses_memory_store() {
        tracing::warn!("Using the in-memory store; data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        let pool = create_pool(&config.database_url)
            .await
            .context("Failed to connect to the database")?;
        Arc::new(PgStore::new(pool))
    };

    let session = ApiSession::new(config.app_env)?;
    let news_api: Arc<dyn NewsSource> = Arc::new(NewsApiProvider::new(
        session.clone(),
        config.news_api_key.clone(),
        config.news_api_url.clone(),
    ));

    let (news, cache_writer) = match &config.redis_url {
        Some(redis_url) => {
            let (cache, handle) = Cache::connect(create_redis_client(redis_url)?)
                .await
                .context("Failed to connect to Redis")?;
            let cached: Arc<dyn NewsSource> = Arc::new(CachedNewsSource::new(news_api, cache));
            (cached, Some(handle))
        }
        None => (news_api, None),
    };

    let analyzer = Arc::new(WatsonNluProvider::new(
        session,
        config.nlu_api_key.clone(),
        config.nlu_url.clone(),
    ));

    let state = AppState::new(
        store,
        news,
        analyzer,
        Arc::new(HttpUrlChecker::new()?),
        PipelineSettings::from(&config),
    );
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, env = ?config.app_env, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
