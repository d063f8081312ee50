use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::prediction::PredictedScore;
use crate::services::ingest::RawMatch;

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitPredictionRequest {
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,
    #[serde(default)]
    pub scores: BTreeMap<String, PredictedScore>,
}

#[derive(Debug, Deserialize)]
pub struct IngestMatchesRequest {
    pub matches: Vec<RawMatch>,
}

#[derive(Debug, Deserialize)]
pub struct ScoresQuery {
    pub league_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CurrentGameweekResponse {
    pub gameweek: u32,
    pub total_gameweeks: u32,
    pub season: String,
}

#[derive(Debug, Serialize)]
pub struct RecomputeResponse {
    pub success: bool,
    pub users_updated: usize,
}
