use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Scheduled,
    Timed,
    InPlay,
    Paused,
    Finished,
}

impl MatchStatus {
    pub fn is_finished(self) -> bool {
        self == MatchStatus::Finished
    }

    pub fn is_upcoming(self) -> bool {
        matches!(self, MatchStatus::Scheduled | MatchStatus::Timed)
    }
}

/// A full-time scoreline. Both sides are always present together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoreLine {
    pub home: u32,
    pub away: u32,
}

impl ScoreLine {
    pub fn new(home: u32, away: u32) -> Self {
        ScoreLine { home, away }
    }
}

// Main Match model - one entry of a gameweek's match cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub kickoff: DateTime<Utc>,
    pub status: MatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<ScoreLine>,
}

impl Match {
    /// Predictions can no longer change once kickoff has passed.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.kickoff <= now
    }
}

// Stored document: all matches of one gameweek, replaced wholesale on refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCache {
    #[serde(rename = "_id")]
    pub id: String,
    pub gameweek: u32,
    pub matches: Vec<Match>,
    pub last_updated: DateTime<Utc>,
}

impl MatchCache {
    pub fn doc_id(gameweek: u32) -> String {
        format!("week_{}", gameweek)
    }
}

/// Manual score correction that survives re-fetches of the match cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreOverride {
    pub gameweek: u32,
    pub match_id: String,
    pub home: u32,
    pub away: u32,
}

impl ScoreOverride {
    pub fn score(&self) -> ScoreLine {
        ScoreLine::new(self.home, self.away)
    }
}
