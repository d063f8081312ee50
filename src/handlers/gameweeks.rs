use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::Utc;
use validator::Validate;

use crate::dtos::gameweek_dtos::{
    CurrentGameweekResponse, IngestMatchesRequest, ScoresQuery, SubmitPredictionRequest,
};
use crate::errors::{AppError, Result};
use crate::models::prediction::Prediction;
use crate::services::calendar::resolve_current_gameweek;
use crate::services::finalization::{FinalizationStatus, FinalizeReport};
use crate::services::ingest::{ingest_matches, IngestReport};
use crate::services::predictions::submit_prediction;
use crate::services::scoreboard::{gameweek_scoreboard, Scoreboard};
use crate::state::AppState;

pub async fn current_gameweek(State(state): State<AppState>) -> Result<Json<CurrentGameweekResponse>> {
    let gameweek = resolve_current_gameweek(state.store.as_ref(), &state.season, None).await?;
    tracing::debug!("Current gameweek resolved to {}", gameweek);

    Ok(Json(CurrentGameweekResponse {
        gameweek,
        total_gameweeks: state.season.total_gameweeks,
        season: state.season.season.clone(),
    }))
}

pub async fn get_scores(
    State(state): State<AppState>,
    Path(gameweek): Path<u32>,
    Query(query): Query<ScoresQuery>,
) -> Result<Json<Scoreboard>> {
    tracing::debug!("GET scores for gameweek {} (league: {:?})", gameweek, query.league_id);
    let board = gameweek_scoreboard(
        state.store.as_ref(),
        &state.season,
        gameweek,
        query.league_id.as_deref(),
    )
    .await?;
    Ok(Json(board))
}

pub async fn finalization_status(
    State(state): State<AppState>,
    Path(gameweek): Path<u32>,
) -> Result<Json<FinalizationStatus>> {
    Ok(Json(state.finalization.status(gameweek).await?))
}

pub async fn finalize(
    State(state): State<AppState>,
    Path(gameweek): Path<u32>,
) -> Result<Json<FinalizeReport>> {
    Ok(Json(state.finalization.finalize(gameweek).await?))
}

pub async fn put_matches(
    State(state): State<AppState>,
    Path(gameweek): Path<u32>,
    Json(payload): Json<IngestMatchesRequest>,
) -> Result<Json<IngestReport>> {
    let report =
        ingest_matches(state.store.as_ref(), &state.season, gameweek, &payload.matches).await?;
    Ok(Json(report))
}

pub async fn put_prediction(
    State(state): State<AppState>,
    Path(gameweek): Path<u32>,
    Json(payload): Json<SubmitPredictionRequest>,
) -> Result<Json<Prediction>> {
    payload.validate()?;
    if payload.scores.is_empty() {
        return Err(AppError::invalid_data("At least one prediction is required"));
    }

    let saved = submit_prediction(
        state.store.as_ref(),
        &state.season,
        gameweek,
        &payload.user_id,
        payload.scores,
        Utc::now(),
    )
    .await?;
    Ok(Json(saved))
}
