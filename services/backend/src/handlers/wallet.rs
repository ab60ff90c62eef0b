use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::constants::DEFAULT_TRANSACTION_PAGE_SIZE;

use crate::{
    domain::{ConvertRequest, DepositRequest, Transaction, Wallet, WithdrawalRequest},
    errors::Result,
    extractors::{CallerId, ValidatedJson},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<Transaction>,
    pub offset: usize,
    pub limit: usize,
}

pub async fn get_wallet(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
) -> Result<Json<Wallet>> {
    let wallet = state.wallet.get_or_create_wallet(&user_id).await?;
    Ok(Json(wallet))
}

pub async fn deposit(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    ValidatedJson(req): ValidatedJson<DepositRequest>,
) -> Result<Json<Transaction>> {
    let tx = state.wallet.process_deposit(&user_id, req).await?;
    Ok(Json(tx))
}

pub async fn withdraw(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    ValidatedJson(req): ValidatedJson<WithdrawalRequest>,
) -> Result<Json<Transaction>> {
    let tx = state.wallet.process_withdrawal(&user_id, req).await?;
    Ok(Json(tx))
}

pub async fn convert(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    ValidatedJson(req): ValidatedJson<ConvertRequest>,
) -> Result<Json<Transaction>> {
    let tx = state
        .wallet
        .convert_currency(&user_id, req.amount, req.from_currency, req.to_currency)
        .await?;
    Ok(Json(tx))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<TransactionsResponse>> {
    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_TRANSACTION_PAGE_SIZE);
    let transactions = state
        .wallet
        .get_transactions(&user_id, offset, limit)
        .await?;
    Ok(Json(TransactionsResponse {
        offset,
        limit: limit.min(shared::constants::MAX_TRANSACTION_PAGE_SIZE),
        transactions,
    }))
}
