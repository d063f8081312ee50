use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::engine::aggregator::GameweekStanding;
use crate::errors::Result;
use crate::models::gameweek::Gameweek;
use crate::models::league::{FixtureTable, League, LeagueStatus};
use crate::models::match_record::{Match, ScoreOverride};
use crate::models::prediction::{PredictedScore, Prediction};
use crate::models::user::User;

pub mod connection;
pub mod memory_store;
pub mod mongo_store;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FinalizeOutcome {
    Applied { users_credited: usize, points_awarded: i64 },
    /// Another caller got there first; nothing was written.
    AlreadyFinalized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RevertOutcome {
    Reverted { users_debited: usize },
    NotFinalized,
}

/// Document store the scoring engine reads snapshots from and commits
/// finalization through.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<()>;

    async fn matches(&self, gameweek: u32) -> Result<Vec<Match>>;
    async fn all_matches(&self) -> Result<BTreeMap<u32, Vec<Match>>>;
    /// Overwrites the whole match cache for the gameweek.
    async fn replace_matches(&self, gameweek: u32, matches: Vec<Match>) -> Result<()>;
    async fn score_overrides(&self, gameweek: u32) -> Result<Vec<ScoreOverride>>;

    async fn predictions(&self, gameweek: u32) -> Result<Vec<Prediction>>;
    async fn prediction(&self, gameweek: u32, user_id: &str) -> Result<Option<Prediction>>;
    /// Upserts the predicted scores only; frozen points are never written here.
    async fn save_prediction_scores(
        &self,
        gameweek: u32,
        user_id: &str,
        scores: BTreeMap<String, PredictedScore>,
    ) -> Result<Prediction>;

    async fn users(&self) -> Result<Vec<User>>;
    async fn user(&self, user_id: &str) -> Result<Option<User>>;

    /// Missing gameweek documents read as open gameweeks.
    async fn gameweek(&self, number: u32) -> Result<Gameweek>;
    async fn gameweeks(&self) -> Result<Vec<Gameweek>>;

    async fn league(&self, league_id: &str) -> Result<Option<League>>;
    async fn save_league_schedule(
        &self,
        league_id: &str,
        status: LeagueStatus,
        fixtures: &FixtureTable,
    ) -> Result<()>;

    /// Atomically credit every standing to its user's total, freeze the
    /// prediction points and flip `is_finalized`. Re-checks the flag inside
    /// the transaction.
    async fn apply_finalization(
        &self,
        gameweek: u32,
        standings: &[GameweekStanding],
    ) -> Result<FinalizeOutcome>;

    /// Atomically subtract the deltas recorded by the last finalization and
    /// reopen the gameweek.
    async fn revert_finalization(&self, gameweek: u32) -> Result<RevertOutcome>;

    /// Rebuild every user's total from the frozen points of finalized
    /// gameweeks. Reads and writes happen in one atomic unit, so a
    /// finalization can never land between them.
    async fn recompute_totals(&self) -> Result<usize>;
}
