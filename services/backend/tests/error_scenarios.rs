/// Integration tests for error handling scenarios
mod common;

use axum::http::StatusCode;
use common::{caller, fund_hc, parse_error, spawn_app};
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn test_missing_caller_header_is_unauthorized() {
    let server = spawn_app().await;

    let response = server.get("/api/wallet").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let body: Value = response.json();
    let (code, _, category) = parse_error(&body).expect("Failed to parse error");
    assert_eq!(code, "UNAUTHORIZED_MISSING_CALLER");
    assert_eq!(category, "Unauthorized");
}

#[tokio::test]
async fn test_validation_error_missing_field() {
    let server = spawn_app().await;
    let (name, value) = caller("user-1");

    // Missing required field "payment_method"
    let response = server
        .post("/api/wallet/deposit")
        .add_header(name, value)
        .json(&json!({ "amount": 500_000 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    let (code, _, category) = parse_error(&body).expect("Failed to parse error");
    assert!(code == "VALIDATION_MISSING_FIELD" || code == "VALIDATION_INVALID_INPUT");
    assert_eq!(category, "Validation");
}

#[tokio::test]
async fn test_deposit_below_minimum_is_rejected() {
    let server = spawn_app().await;
    let (name, value) = caller("user-1");

    // 50.00 INR, below the 100.00 INR floor.
    let response = server
        .post("/api/wallet/deposit")
        .add_header(name, value)
        .json(&json!({ "amount": 5_000, "payment_method": "upi" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    let (code, message, category) = parse_error(&body).expect("Failed to parse error");
    assert_eq!(code, "VALIDATION_INVALID_INPUT");
    assert_eq!(category, "Validation");
    assert!(message.contains("Minimum deposit"));
}

#[tokio::test]
async fn test_withdrawal_with_insufficient_funds() {
    let server = spawn_app().await;
    let (name, value) = caller("user-1");

    // 1000.00 INR in, 10_000.00 INR requested out.
    let response = server
        .post("/api/wallet/deposit")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "amount": 100_000, "payment_method": "upi" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server
        .post("/api/wallet/withdraw")
        .add_header(name, value)
        .json(&json!({ "amount": 1_000_000, "payment_method": "bank_transfer" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    let (code, _, category) = parse_error(&body).expect("Failed to parse error");
    assert_eq!(code, "VALIDATION_INSUFFICIENT_FUNDS");
    assert_eq!(category, "Validation");
}

#[tokio::test]
async fn test_conversion_between_identical_currencies() {
    let server = spawn_app().await;
    let (name, value) = caller("user-1");

    let response = server
        .post("/api/wallet/convert")
        .add_header(name, value)
        .json(&json!({
            "amount": 10_000,
            "from_currency": "INR",
            "to_currency": "INR"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    let (code, _, _) = parse_error(&body).expect("Failed to parse error");
    assert_eq!(code, "VALIDATION_INVALID_CONVERSION");
}

#[tokio::test]
async fn test_session_for_unknown_game() {
    let server = spawn_app().await;
    let (name, value) = caller("user-1");
    fund_hc(&server, "user-1", 100).await;

    let response = server
        .post("/api/sessions")
        .add_header(name, value)
        .json(&json!({ "game_id": "roulette", "bet_amount": 100 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let body: Value = response.json();
    let (code, _, category) = parse_error(&body).expect("Failed to parse error");
    assert_eq!(code, "NOT_FOUND_GAME");
    assert_eq!(category, "NotFound");
}

#[tokio::test]
async fn test_round_on_unknown_session() {
    let server = spawn_app().await;
    let (name, value) = caller("user-1");
    fund_hc(&server, "user-1", 100).await;

    let response = server
        .post(&format!("/api/sessions/{}/round", Uuid::new_v4()))
        .add_header(name, value)
        .json(&json!({
            "bet_amount": 100,
            "game": "dice",
            "target": 7,
            "direction": "over"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let body: Value = response.json();
    let (code, _, _) = parse_error(&body).expect("Failed to parse error");
    assert_eq!(code, "NOT_FOUND_SESSION");
}

#[tokio::test]
async fn test_round_on_someone_elses_session_is_forbidden() {
    let server = spawn_app().await;
    fund_hc(&server, "user-1", 100).await;
    fund_hc(&server, "user-2", 100).await;

    let (owner_name, owner_value) = caller("user-1");
    let response = server
        .post("/api/sessions")
        .add_header(owner_name, owner_value)
        .json(&json!({ "game_id": "dice", "bet_amount": 100 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let session: Value = response.json();
    let session_id = session["session_id"].as_str().unwrap().to_string();

    let (other_name, other_value) = caller("user-2");
    let response = server
        .post(&format!("/api/sessions/{}/round", session_id))
        .add_header(other_name, other_value)
        .json(&json!({
            "bet_amount": 100,
            "game": "dice",
            "target": 7,
            "direction": "over"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let body: Value = response.json();
    let (code, _, category) = parse_error(&body).expect("Failed to parse error");
    assert_eq!(code, "UNAUTHORIZED_SESSION_OWNER");
    assert_eq!(category, "Unauthorized");
}

#[tokio::test]
async fn test_mismatched_round_params_are_rejected() {
    let server = spawn_app().await;
    fund_hc(&server, "user-1", 100).await;

    let (name, value) = caller("user-1");
    let response = server
        .post("/api/sessions")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "game_id": "crash", "bet_amount": 100 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let session: Value = response.json();
    let session_id = session["session_id"].as_str().unwrap().to_string();

    let response = server
        .post(&format!("/api/sessions/{}/round", session_id))
        .add_header(name, value)
        .json(&json!({
            "bet_amount": 100,
            "game": "dice",
            "target": 7,
            "direction": "over"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    let (_, message, category) = parse_error(&body).expect("Failed to parse error");
    assert_eq!(category, "Validation");
    assert!(message.contains("do not match"));
}
