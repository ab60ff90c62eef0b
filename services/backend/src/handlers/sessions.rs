use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    domain::{CreateSessionRequest, GameResult, GameSession, PlayRoundRequest, RoundResponse},
    errors::Result,
    extractors::{CallerId, ValidatedJson},
    state::AppState,
};

#[derive(Serialize)]
pub struct SessionResultsResponse {
    pub results: Vec<GameResult>,
}

pub async fn create_session(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    ValidatedJson(req): ValidatedJson<CreateSessionRequest>,
) -> Result<Json<GameSession>> {
    let session = state
        .gaming
        .start_session(&user_id, &req.game_id, req.bet_amount)
        .await?;
    Ok(Json(session))
}

pub async fn play_round(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(session_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<PlayRoundRequest>,
) -> Result<Json<RoundResponse>> {
    let response = state
        .gaming
        .play_round(&user_id, session_id, req.bet_amount, req.params)
        .await?;
    Ok(Json(response))
}

pub async fn end_session(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(session_id): Path<Uuid>,
) -> Result<Json<GameSession>> {
    let session = state.gaming.end_session(&user_id, session_id).await?;
    Ok(Json(session))
}

pub async fn get_session(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(session_id): Path<Uuid>,
) -> Result<Json<GameSession>> {
    let session = state.gaming.get_session(&user_id, session_id).await?;
    Ok(Json(session))
}

pub async fn list_session_results(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResultsResponse>> {
    let results = state
        .gaming
        .get_session_results(&user_id, session_id)
        .await?;
    Ok(Json(SessionResultsResponse { results }))
}
