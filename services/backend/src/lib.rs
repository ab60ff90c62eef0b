// Library interface for backend - exposes modules for testing

pub mod config;
pub mod domain;
pub mod errors;
pub mod extractors;
pub mod games;
pub mod handlers;
pub mod reconciliation;
pub mod repository;
pub mod services;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))
        .route("/health/detailed", get(handlers::health::detailed_health))
        // Wallet
        .route("/api/wallet", get(handlers::wallet::get_wallet))
        .route("/api/wallet/deposit", post(handlers::wallet::deposit))
        .route("/api/wallet/withdraw", post(handlers::wallet::withdraw))
        .route("/api/wallet/convert", post(handlers::wallet::convert))
        .route(
            "/api/wallet/transactions",
            get(handlers::wallet::list_transactions),
        )
        // Game catalog
        .route("/api/games", get(handlers::games::list_games))
        // Sessions and rounds
        .route("/api/sessions", post(handlers::sessions::create_session))
        .route(
            "/api/sessions/:session_id/round",
            post(handlers::sessions::play_round),
        )
        .route(
            "/api/sessions/:session_id/end",
            post(handlers::sessions::end_session),
        )
        .route(
            "/api/sessions/:session_id",
            get(handlers::sessions::get_session),
        )
        .route(
            "/api/sessions/:session_id/results",
            get(handlers::sessions::list_session_results),
        )
        // Metrics
        .route("/metrics", get(handlers::metrics::metrics_handler))
        // State
        .with_state(state)
        // Middleware
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
