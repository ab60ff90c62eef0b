use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use backend::config::Config;
use backend::repository::{
    seed_default_games, RedisGameCatalog, RedisLedgerRepository, RedisSessionRepository,
};
use backend::state::AppState;
use backend::{build_router, reconciliation};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with JSON formatting (configurable via env)
    let use_json = std::env::var("LOG_FORMAT")
        .unwrap_or_else(|_| "text".to_string())
        .eq_ignore_ascii_case("json");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "backend=info,tower_http=info".into());

    if use_json {
        // JSON structured logging for production
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        // Human-readable logging for development
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        service = "backend",
        version = env!("CARGO_PKG_VERSION"),
        log_format = if use_json { "json" } else { "text" },
        "Starting backend service"
    );

    // Load configuration
    let config = Config::load()?;
    tracing::info!("Configuration loaded");

    // Initialize Redis connection
    let redis_client = redis::Client::open(config.redis.url.clone())?;
    let redis_conn = redis_client.get_connection_manager().await?;

    tracing::info!("Redis connected");

    // Wire up repositories and services
    let ledger = Arc::new(RedisLedgerRepository::new(redis_conn.clone()));
    let sessions = Arc::new(RedisSessionRepository::new(redis_conn.clone()));
    let catalog = Arc::new(RedisGameCatalog::new(redis_conn));
    seed_default_games(catalog.as_ref()).await?;

    let app_state = AppState::new(config.clone(), ledger.clone(), sessions, catalog);

    // Build router
    let app = build_router(app_state);

    // Start background workers
    let metrics_handle = tokio::spawn(start_metrics_server(config.metrics_port));
    tokio::spawn(reconciliation::run_sweeper(
        ledger,
        config.reconciliation.clone(),
    ));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    tracing::info!("Backend API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    metrics_handle.await??;

    Ok(())
}

async fn start_metrics_server(port: u16) -> anyhow::Result<()> {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let handle = builder.install_recorder()?;

    let app = Router::new().route("/metrics", get(|| async move { handle.render() }));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Metrics server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
