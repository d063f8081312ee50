use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use validator::Validate;

use crate::dtos::league_dtos::{RegenerateFixturesRequest, StandingsQuery};
use crate::errors::Result;
use crate::models::league::League;
use crate::services::leagues::{
    league_table, regenerate_fixtures, round_fixtures, start_league, LeagueTable, RoundFixtures,
};
use crate::state::AppState;

pub async fn get_standings(
    State(state): State<AppState>,
    Path(league_id): Path<String>,
    Query(query): Query<StandingsQuery>,
) -> Result<Json<LeagueTable>> {
    tracing::debug!("GET standings for league {}", league_id);
    let table = league_table(
        state.store.as_ref(),
        &state.season,
        &league_id,
        query.current_gameweek,
    )
    .await?;
    Ok(Json(table))
}

pub async fn get_fixtures(
    State(state): State<AppState>,
    Path((league_id, gameweek)): Path<(String, u32)>,
) -> Result<Json<RoundFixtures>> {
    let fixtures = round_fixtures(state.store.as_ref(), &state.season, &league_id, gameweek).await?;
    Ok(Json(fixtures))
}

pub async fn start(
    State(state): State<AppState>,
    Path(league_id): Path<String>,
) -> Result<Json<League>> {
    let league = start_league(state.store.as_ref(), &state.season, &league_id).await?;
    Ok(Json(league))
}

pub async fn regenerate(
    State(state): State<AppState>,
    Path(league_id): Path<String>,
    Json(payload): Json<RegenerateFixturesRequest>,
) -> Result<Json<League>> {
    payload.validate()?;
    let league = regenerate_fixtures(
        state.store.as_ref(),
        &state.season,
        &league_id,
        payload.from_gameweek,
    )
    .await?;
    Ok(Json(league))
}
