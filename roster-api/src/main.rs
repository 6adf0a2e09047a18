//! Roster API Server Entry Point
//!
//! Reads configuration, connects to the store, warms the cache, then serves
//! HTTP until Ctrl-C while the refresher reloads the cache in the
//! background.

use std::sync::Arc;

use roster_api::telemetry::init_tracing;
use roster_api::{
    create_api_router, ApiError, ApiResult, AppState, PgEntityStore, Refresher, ServiceConfig,
};
use roster_storage::{EntityCache, EntityStore, TimeoutStore};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> ApiResult<()> {
    init_tracing()?;

    let config = ServiceConfig::from_env()?;
    let addr = config.bind_addr()?;

    let pg = PgEntityStore::connect(&config).await?;
    let store: Arc<dyn EntityStore> = Arc::new(TimeoutStore::new(pg, config.store_timeout));
    let cache = Arc::new(EntityCache::new());

    let refresher = Refresher::new(Arc::clone(&store), Arc::clone(&cache), config.refresh_config());
    refresher.warm().await;

    let state = AppState::new(store, cache, refresher.status());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresh_handle = refresher.spawn(shutdown_rx);

    let app = create_api_router(state);

    tracing::info!(%addr, "Starting Roster API server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;

    let _ = shutdown_tx.send(true);
    refresh_handle
        .await
        .map_err(|e| ApiError::internal_error(format!("Refresher task failed: {}", e)))?;

    tracing::info!("Roster API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
