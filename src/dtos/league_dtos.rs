use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegenerateFixturesRequest {
    #[validate(range(min = 1, message = "from_gameweek must be at least 1"))]
    pub from_gameweek: u32,
}

#[derive(Debug, Deserialize)]
pub struct StandingsQuery {
    pub current_gameweek: Option<u32>,
}
