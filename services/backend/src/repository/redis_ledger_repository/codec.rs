//! Conversion between domain objects and Redis hash storage.
//!
//! Amounts are stored as decimal minor-unit strings, timestamps as epoch
//! milliseconds, optional fields as empty strings.

use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use shared::{Amount, Multiplier};

use crate::domain::{GameResult, GameSession, RoundOutcome, Transaction, Wallet};
use crate::errors::{AppError, Result};

use super::status::*;

fn parse_field<T: std::str::FromStr>(
    map: &HashMap<String, String>,
    field: &str,
    entity: &str,
) -> Result<T> {
    map.get(field)
        .and_then(|v| v.parse::<T>().ok())
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Invalid {} field for {}", field, entity))
        })
}

fn parse_timestamp_ms(
    map: &HashMap<String, String>,
    field: &str,
    entity: &str,
) -> Result<DateTime<Utc>> {
    let ms: i64 = parse_field(map, field, entity)?;
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Invalid {} for {}", field, entity)))
}

fn optional(map: &HashMap<String, String>, field: &str) -> Option<String> {
    map.get(field).cloned().filter(|v| !v.is_empty())
}

pub fn wallet_to_fields(wallet: &Wallet) -> Vec<(String, String)> {
    vec![
        ("wallet_id".into(), wallet.wallet_id.to_string()),
        ("user_id".into(), wallet.user_id.clone()),
        ("inr_balance".into(), wallet.inr_balance.minor().to_string()),
        ("hc_balance".into(), wallet.hc_balance.minor().to_string()),
        (
            "total_deposited".into(),
            wallet.total_deposited.minor().to_string(),
        ),
        (
            "total_withdrawn".into(),
            wallet.total_withdrawn.minor().to_string(),
        ),
        (
            "total_bet_amount".into(),
            wallet.total_bet_amount.minor().to_string(),
        ),
        (
            "total_winnings".into(),
            wallet.total_winnings.minor().to_string(),
        ),
        (
            "welcome_bonus_claimed".into(),
            if wallet.welcome_bonus_claimed { "1" } else { "0" }.into(),
        ),
        (
            "created_at_ms".into(),
            wallet.created_at.timestamp_millis().to_string(),
        ),
        (
            "updated_at_ms".into(),
            wallet.updated_at.timestamp_millis().to_string(),
        ),
    ]
}

pub fn wallet_from_hash(map: &HashMap<String, String>, user_id: &str) -> Result<Wallet> {
    Ok(Wallet {
        wallet_id: parse_field(map, "wallet_id", user_id)?,
        user_id: map.get("user_id").cloned().unwrap_or_else(|| user_id.to_string()),
        inr_balance: Amount::from_minor(parse_field(map, "inr_balance", user_id)?),
        hc_balance: Amount::from_minor(parse_field(map, "hc_balance", user_id)?),
        total_deposited: Amount::from_minor(parse_field(map, "total_deposited", user_id)?),
        total_withdrawn: Amount::from_minor(parse_field(map, "total_withdrawn", user_id)?),
        total_bet_amount: Amount::from_minor(parse_field(map, "total_bet_amount", user_id)?),
        total_winnings: Amount::from_minor(parse_field(map, "total_winnings", user_id)?),
        welcome_bonus_claimed: map.get("welcome_bonus_claimed").map(String::as_str) == Some("1"),
        created_at: parse_timestamp_ms(map, "created_at_ms", user_id)?,
        updated_at: parse_timestamp_ms(map, "updated_at_ms", user_id)?,
    })
}

pub fn transaction_to_fields(tx: &Transaction) -> Vec<(String, String)> {
    vec![
        ("transaction_id".into(), tx.transaction_id.to_string()),
        ("user_id".into(), tx.user_id.clone()),
        ("wallet_id".into(), tx.wallet_id.to_string()),
        ("kind".into(), kind_to_string(&tx.kind).into()),
        ("amount".into(), tx.amount.minor().to_string()),
        ("currency".into(), currency_to_string(&tx.currency).into()),
        ("status".into(), tx_status_to_string(&tx.status).into()),
        (
            "payment_method".into(),
            tx.payment_method
                .as_ref()
                .map(|m| payment_method_to_string(m).to_string())
                .unwrap_or_default(),
        ),
        (
            "external_id".into(),
            tx.external_id.clone().unwrap_or_default(),
        ),
        (
            "balance_before".into(),
            tx.balance_before.minor().to_string(),
        ),
        (
            "balance_after".into(),
            tx.balance_after
                .map(|a| a.minor().to_string())
                .unwrap_or_default(),
        ),
        ("description".into(), tx.description.clone()),
        (
            "created_at_ms".into(),
            tx.created_at.timestamp_millis().to_string(),
        ),
        (
            "updated_at_ms".into(),
            tx.updated_at.timestamp_millis().to_string(),
        ),
    ]
}

pub fn transaction_from_hash(
    map: &HashMap<String, String>,
    transaction_id: Uuid,
) -> Result<Transaction> {
    let entity = transaction_id.to_string();

    let kind_str: String = parse_field(map, "kind", &entity)?;
    let kind = kind_from_string(&kind_str).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("Invalid kind '{}' for tx {}", kind_str, entity))
    })?;

    let status_str: String = parse_field(map, "status", &entity)?;
    let status = tx_status_from_string(&status_str).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "Invalid status '{}' for tx {}",
            status_str,
            entity
        ))
    })?;

    let currency_str: String = parse_field(map, "currency", &entity)?;
    let currency = currency_from_string(&currency_str).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "Invalid currency '{}' for tx {}",
            currency_str,
            entity
        ))
    })?;

    Ok(Transaction {
        transaction_id,
        user_id: map.get("user_id").cloned().unwrap_or_default(),
        wallet_id: parse_field(map, "wallet_id", &entity)?,
        kind,
        amount: Amount::from_minor(parse_field(map, "amount", &entity)?),
        currency,
        status,
        payment_method: optional(map, "payment_method")
            .and_then(|s| payment_method_from_string(&s)),
        external_id: optional(map, "external_id"),
        balance_before: Amount::from_minor(parse_field(map, "balance_before", &entity)?),
        balance_after: optional(map, "balance_after")
            .and_then(|v| v.parse::<i64>().ok())
            .map(Amount::from_minor),
        description: map.get("description").cloned().unwrap_or_default(),
        created_at: parse_timestamp_ms(map, "created_at_ms", &entity)?,
        updated_at: parse_timestamp_ms(map, "updated_at_ms", &entity)?,
    })
}

pub fn session_to_fields(session: &GameSession) -> Vec<(String, String)> {
    vec![
        ("session_id".into(), session.session_id.to_string()),
        ("user_id".into(), session.user_id.clone()),
        ("game_id".into(), session.game_id.clone()),
        ("currency".into(), currency_to_string(&session.currency).into()),
        (
            "status".into(),
            session_status_to_string(&session.status).into(),
        ),
        (
            "started_at_ms".into(),
            session.started_at.timestamp_millis().to_string(),
        ),
        (
            "ended_at_ms".into(),
            session
                .ended_at
                .map(|t| t.timestamp_millis().to_string())
                .unwrap_or_default(),
        ),
        ("total_spins".into(), session.total_spins.to_string()),
        ("total_bet".into(), session.total_bet.minor().to_string()),
        (
            "total_winnings".into(),
            session.total_winnings.minor().to_string(),
        ),
    ]
}

pub fn session_from_hash(map: &HashMap<String, String>, session_id: Uuid) -> Result<GameSession> {
    let entity = session_id.to_string();

    let status_str: String = parse_field(map, "status", &entity)?;
    let status = session_status_from_string(&status_str).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "Invalid status '{}' for session {}",
            status_str,
            entity
        ))
    })?;

    let currency_str: String = parse_field(map, "currency", &entity)?;
    let currency = currency_from_string(&currency_str).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "Invalid currency '{}' for session {}",
            currency_str,
            entity
        ))
    })?;

    Ok(GameSession {
        session_id,
        user_id: map.get("user_id").cloned().unwrap_or_default(),
        game_id: map.get("game_id").cloned().unwrap_or_default(),
        currency,
        status,
        started_at: parse_timestamp_ms(map, "started_at_ms", &entity)?,
        ended_at: optional(map, "ended_at_ms")
            .and_then(|v| v.parse::<i64>().ok())
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        total_spins: parse_field(map, "total_spins", &entity)?,
        total_bet: Amount::from_minor(parse_field(map, "total_bet", &entity)?),
        total_winnings: Amount::from_minor(parse_field(map, "total_winnings", &entity)?),
    })
}

pub fn result_to_fields(result: &GameResult) -> Result<Vec<(String, String)>> {
    let outcome_json = serde_json::to_string(&result.outcome)
        .map_err(|e| AppError::Storage(format!("Failed to encode outcome: {}", e)))?;

    Ok(vec![
        ("result_id".into(), result.result_id.to_string()),
        ("session_id".into(), result.session_id.to_string()),
        ("user_id".into(), result.user_id.clone()),
        ("game_id".into(), result.game_id.clone()),
        ("bet_amount".into(), result.bet_amount.minor().to_string()),
        ("win_amount".into(), result.win_amount.minor().to_string()),
        (
            "multiplier_bp".into(),
            result.multiplier.as_bp().to_string(),
        ),
        ("outcome".into(), outcome_json),
        (
            "is_winning".into(),
            if result.is_winning { "1" } else { "0" }.into(),
        ),
        (
            "created_at_ms".into(),
            result.created_at.timestamp_millis().to_string(),
        ),
    ])
}

pub fn result_from_hash(map: &HashMap<String, String>, result_id: Uuid) -> Result<GameResult> {
    let entity = result_id.to_string();

    let outcome: RoundOutcome = map
        .get("outcome")
        .and_then(|v| serde_json::from_str(v).ok())
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Invalid outcome for result {}", entity))
        })?;

    Ok(GameResult {
        result_id,
        session_id: parse_field(map, "session_id", &entity)?,
        user_id: map.get("user_id").cloned().unwrap_or_default(),
        game_id: map.get("game_id").cloned().unwrap_or_default(),
        bet_amount: Amount::from_minor(parse_field(map, "bet_amount", &entity)?),
        win_amount: Amount::from_minor(parse_field(map, "win_amount", &entity)?),
        multiplier: Multiplier::from_bp(parse_field(map, "multiplier_bp", &entity)?),
        outcome,
        is_winning: map.get("is_winning").map(String::as_str) == Some("1"),
        created_at: parse_timestamp_ms(map, "created_at_ms", &entity)?,
    })
}
