use axum::{
    extract::{Path, State},
    response::Json,
};

use crate::database::RevertOutcome;
use crate::dtos::gameweek_dtos::RecomputeResponse;
use crate::errors::Result;
use crate::state::AppState;

pub async fn unfinalize(
    State(state): State<AppState>,
    Path(gameweek): Path<u32>,
) -> Result<Json<RevertOutcome>> {
    tracing::warn!("Admin requested unfinalize of gameweek {}", gameweek);
    Ok(Json(state.finalization.unfinalize(gameweek).await?))
}

pub async fn recompute_totals(State(state): State<AppState>) -> Result<Json<RecomputeResponse>> {
    let users_updated = state.finalization.recompute_totals().await?;
    Ok(Json(RecomputeResponse {
        success: true,
        users_updated,
    }))
}
