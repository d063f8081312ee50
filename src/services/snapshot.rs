use std::collections::HashSet;

use crate::config::ScoringRules;
use crate::database::Store;
use crate::engine::aggregator::{aggregate_gameweek, GameweekStanding};
use crate::errors::Result;
use crate::models::gameweek::Gameweek;
use crate::models::match_record::{Match, ScoreOverride};
use crate::models::prediction::Prediction;

/// Everything one aggregation pass over a gameweek reads from the store.
#[derive(Debug, Clone)]
pub struct GameweekSnapshot {
    pub gameweek: Gameweek,
    pub matches: Vec<Match>,
    pub overrides: Vec<ScoreOverride>,
    pub predictions: Vec<Prediction>,
    pub valid_users: HashSet<String>,
}

impl GameweekSnapshot {
    pub async fn load(store: &dyn Store, gameweek: u32) -> Result<Self> {
        let record = store.gameweek(gameweek).await?;
        let matches = store.matches(gameweek).await?;
        let overrides = store.score_overrides(gameweek).await?;
        let predictions = store.predictions(gameweek).await?;
        let valid_users = store.users().await?.into_iter().map(|u| u.id).collect();

        tracing::debug!(
            "Loaded gameweek {} snapshot: {} matches, {} overrides, {} predictions",
            gameweek,
            matches.len(),
            overrides.len(),
            predictions.len()
        );

        Ok(GameweekSnapshot {
            gameweek: record,
            matches,
            overrides,
            predictions,
            valid_users,
        })
    }

    /// Narrow the ranked users to a league's members.
    pub fn restrict_to(&mut self, members: &[String]) {
        let members: HashSet<&String> = members.iter().collect();
        self.valid_users.retain(|id| members.contains(id));
    }

    pub fn standings(&self, rules: &ScoringRules) -> Vec<GameweekStanding> {
        aggregate_gameweek(
            &self.matches,
            &self.overrides,
            &self.predictions,
            &self.valid_users,
            rules,
        )
    }
}
