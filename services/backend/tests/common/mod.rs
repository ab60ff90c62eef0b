/// Common test utilities: an in-process server over the in-memory storage.
use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use backend::build_router;
use backend::config::Config;
use backend::repository::{
    seed_default_games, MemoryGameCatalog, MemoryLedgerRepository, MemorySessionRepository,
};
use backend::state::AppState;
use serde_json::{json, Value};

pub async fn spawn_app() -> TestServer {
    let ledger = Arc::new(MemoryLedgerRepository::new());
    let catalog = Arc::new(MemoryGameCatalog::new());
    seed_default_games(catalog.as_ref())
        .await
        .expect("Failed to seed game catalog");

    let state = AppState::new(
        Config::default(),
        ledger,
        Arc::new(MemorySessionRepository::new()),
        catalog,
    );
    TestServer::new(build_router(state)).expect("Failed to start test server")
}

pub fn caller(user_id: &'static str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-user-id"),
        HeaderValue::from_static(user_id),
    )
}

/// Extract (code, message, category) from a standardized error body.
pub fn parse_error(body: &Value) -> Option<(String, String, String)> {
    let error = body.get("error")?;
    Some((
        error.get("code")?.as_str()?.to_string(),
        error.get("message")?.as_str()?.to_string(),
        error.get("category")?.as_str()?.to_string(),
    ))
}

/// Deposit enough INR and convert it so the user holds `hc_minor` HC in
/// minor units (plus the one-time welcome bonus).
pub async fn fund_hc(server: &TestServer, user: &'static str, hc_minor: i64) {
    let (name, value) = caller(user);
    let response = server
        .post("/api/wallet/deposit")
        .add_header(name.clone(), value.clone())
        .json(&json!({
            "amount": hc_minor * 1_000,
            "payment_method": "upi"
        }))
        .await;
    assert_eq!(response.status_code(), 200, "deposit failed: {}", response.text());

    let response = server
        .post("/api/wallet/convert")
        .add_header(name, value)
        .json(&json!({
            "amount": hc_minor * 1_000,
            "from_currency": "INR",
            "to_currency": "HC"
        }))
        .await;
    assert_eq!(response.status_code(), 200, "convert failed: {}", response.text());
}
