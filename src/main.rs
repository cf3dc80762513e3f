//! ScoreLeague API server entry point

use scoreleague_api::config::Config;
use scoreleague_api::handlers::{router, AppState};
use scoreleague_api::seed_matches::seed_if_empty;
use scoreleague_api::settlement::SettlementEngine;
use scoreleague_api::store::{GameStore, JsonFilePersistence};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    let persistence = JsonFilePersistence::new(&config.storage.data_file);
    let store = Arc::new(GameStore::open(Box::new(persistence)).await);
    seed_if_empty(&store).await;

    let engine = Arc::new(SettlementEngine::new(store.clone()));
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState {
        store: store.clone(),
        engine,
        config: Arc::new(config),
        started_at: Instant::now(),
    };

    info!(%addr, "starting ScoreLeague API server");

    axum::Server::bind(&addr)
        .serve(router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Flush once more so a clean shutdown leaves the freshest document on disk
    let mut data = store.write().await;
    store.persist(&mut data).await;
    info!("server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("shutdown signal received");
}
