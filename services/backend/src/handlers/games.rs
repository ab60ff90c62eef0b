use axum::{extract::State, Json};
use serde::Serialize;

use crate::{domain::Game, errors::Result, state::AppState};

#[derive(Debug, Serialize)]
pub struct GamesResponse {
    pub games: Vec<Game>,
}

pub async fn list_games(State(state): State<AppState>) -> Result<Json<GamesResponse>> {
    let games = state.gaming.list_games().await?;
    Ok(Json(GamesResponse { games }))
}
