use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use capvault_core::ScraperConfig;
use capvault_db::{Database, DatabaseConfig};
use capvault_server::routes;
use capvault_server::state::AppState;

const DEFAULT_LOG_FILTER: &str =
    "capvault_server=info,capvault_core=info,capvault_client=info,capvault_db=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(false)
        .init();

    let port = std::env::var("CAPVAULT_SERVER_PORT").unwrap_or_else(|_| "5001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let scraper = ScraperConfig::from_env()?;
    let db = Database::open(&DatabaseConfig::from_env()?).await?;

    let state = Arc::new(AppState::new(db.clone(), scraper)?);

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
