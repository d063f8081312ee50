use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::match_record::ScoreLine;

/// One predicted scoreline as submitted by a user. Values that are not
/// non-negative integers are kept as `None` and the match is left unscored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PredictedScore {
    #[serde(default, deserialize_with = "deserialize_goals")]
    pub home: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_goals")]
    pub away: Option<u32>,
}

impl PredictedScore {
    #[cfg(test)]
    pub fn new(home: u32, away: u32) -> Self {
        PredictedScore {
            home: Some(home),
            away: Some(away),
        }
    }

    pub fn scoreline(&self) -> Option<ScoreLine> {
        match (self.home, self.away) {
            (Some(home), Some(away)) => Some(ScoreLine::new(home, away)),
            _ => None,
        }
    }
}

// Stored document, one per (gameweek, user)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "_id")]
    pub id: String,
    pub gameweek: u32,
    pub user_id: String,
    #[serde(default)]
    pub scores: BTreeMap<String, PredictedScore>,
    /// Frozen at finalization. `None` while the gameweek is open.
    #[serde(default)]
    pub points: Option<i64>,
}

impl Prediction {
    pub fn new(gameweek: u32, user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        Prediction {
            id: Self::doc_id(gameweek, &user_id),
            gameweek,
            user_id,
            scores: BTreeMap::new(),
            points: None,
        }
    }

    pub fn doc_id(gameweek: u32, user_id: &str) -> String {
        format!("{}_{}", gameweek, user_id)
    }

    #[cfg(test)]
    pub fn with_score(mut self, match_id: impl Into<String>, home: u32, away: u32) -> Self {
        self.scores
            .insert(match_id.into(), PredictedScore::new(home, away));
        self
    }
}

// Accepts integers, whole floats and numeric strings; anything else is unscored
fn deserialize_goals<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawGoals {
        Int(i64),
        Float(f64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    let goals = match Option::<RawGoals>::deserialize(deserializer)? {
        Some(RawGoals::Int(i)) => u32::try_from(i).ok(),
        Some(RawGoals::Float(f)) if f.fract() == 0.0 && f >= 0.0 && f <= u32::MAX as f64 => {
            Some(f as u32)
        }
        Some(RawGoals::Text(s)) => s.trim().parse::<u32>().ok(),
        Some(RawGoals::Float(_)) | Some(RawGoals::Other(_)) | None => None,
    };
    Ok(goals)
}
