use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::database::{FinalizeOutcome, RevertOutcome, Store};
use crate::engine::aggregator::GameweekStanding;
use crate::errors::{AppError, Result};
use crate::models::gameweek::Gameweek;
use crate::models::league::{FixtureTable, League, LeagueStatus};
use crate::models::match_record::{Match, ScoreOverride};
use crate::models::prediction::{PredictedScore, Prediction};
use crate::models::user::User;

#[derive(Debug, Default)]
struct MemoryData {
    matches: BTreeMap<u32, Vec<Match>>,
    overrides: Vec<ScoreOverride>,
    predictions: BTreeMap<(u32, String), Prediction>,
    users: BTreeMap<String, User>,
    gameweeks: BTreeMap<u32, Gameweek>,
    leagues: BTreeMap<String, League>,
}

#[derive(Debug, Deserialize)]
struct SeedMatches {
    gameweek: u32,
    matches: Vec<Match>,
}

// JSON snapshot used to boot the in-memory backend
#[derive(Debug, Default, Deserialize)]
struct Seed {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    leagues: Vec<League>,
    #[serde(default)]
    matches: Vec<SeedMatches>,
    #[serde(default)]
    predictions: Vec<Prediction>,
    #[serde(default)]
    overrides: Vec<ScoreOverride>,
    #[serde(default)]
    gameweeks: Vec<Gameweek>,
}

/// Process-local store. One lock guards the whole dataset, so every
/// operation is serialized and trivially atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<MemoryData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn from_seed_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::configuration(format!("Cannot read {}: {}", path.display(), e)))?;
        let seed: Seed = serde_json::from_str(&raw)
            .map_err(|e| AppError::configuration(format!("Invalid seed file: {}", e)))?;

        let store = MemoryStore::new();
        {
            let mut data = store.data.lock().await;
            for user in seed.users {
                data.users.insert(user.id.clone(), user);
            }
            for league in seed.leagues {
                data.leagues.insert(league.id.clone(), league);
            }
            for entry in seed.matches {
                data.matches.insert(entry.gameweek, entry.matches);
            }
            for prediction in seed.predictions {
                data.predictions
                    .insert((prediction.gameweek, prediction.user_id.clone()), prediction);
            }
            for gameweek in seed.gameweeks {
                data.gameweeks.insert(gameweek.number, gameweek);
            }
            data.overrides = seed.overrides;
        }
        tracing::info!("📦 Loaded in-memory store from {}", path.display());
        Ok(store)
    }
}

// Fixture helpers for tests
#[cfg(test)]
impl MemoryStore {
    pub async fn insert_user(&self, user: User) {
        self.data.lock().await.users.insert(user.id.clone(), user);
    }

    pub async fn set_total(&self, user_id: &str, total: i64) {
        if let Some(user) = self.data.lock().await.users.get_mut(user_id) {
            user.total_score = total;
        }
    }

    pub async fn remove_user(&self, user_id: &str) {
        self.data.lock().await.users.remove(user_id);
    }

    pub async fn insert_league(&self, league: League) {
        self.data.lock().await.leagues.insert(league.id.clone(), league);
    }

    pub async fn insert_prediction(&self, prediction: Prediction) {
        self.data
            .lock()
            .await
            .predictions
            .insert((prediction.gameweek, prediction.user_id.clone()), prediction);
    }

    pub async fn insert_override(&self, score_override: ScoreOverride) {
        let mut data = self.data.lock().await;
        data.overrides.retain(|o| {
            !(o.gameweek == score_override.gameweek && o.match_id == score_override.match_id)
        });
        data.overrides.push(score_override);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn matches(&self, gameweek: u32) -> Result<Vec<Match>> {
        Ok(self
            .data
            .lock()
            .await
            .matches
            .get(&gameweek)
            .cloned()
            .unwrap_or_default())
    }

    async fn all_matches(&self) -> Result<BTreeMap<u32, Vec<Match>>> {
        Ok(self.data.lock().await.matches.clone())
    }

    async fn replace_matches(&self, gameweek: u32, matches: Vec<Match>) -> Result<()> {
        self.data.lock().await.matches.insert(gameweek, matches);
        Ok(())
    }

    async fn score_overrides(&self, gameweek: u32) -> Result<Vec<ScoreOverride>> {
        Ok(self
            .data
            .lock()
            .await
            .overrides
            .iter()
            .filter(|o| o.gameweek == gameweek)
            .cloned()
            .collect())
    }

    async fn predictions(&self, gameweek: u32) -> Result<Vec<Prediction>> {
        Ok(self
            .data
            .lock()
            .await
            .predictions
            .values()
            .filter(|p| p.gameweek == gameweek)
            .cloned()
            .collect())
    }

    async fn prediction(&self, gameweek: u32, user_id: &str) -> Result<Option<Prediction>> {
        Ok(self
            .data
            .lock()
            .await
            .predictions
            .get(&(gameweek, user_id.to_string()))
            .cloned())
    }

    async fn save_prediction_scores(
        &self,
        gameweek: u32,
        user_id: &str,
        scores: BTreeMap<String, PredictedScore>,
    ) -> Result<Prediction> {
        let mut data = self.data.lock().await;
        let prediction = data
            .predictions
            .entry((gameweek, user_id.to_string()))
            .or_insert_with(|| Prediction::new(gameweek, user_id));
        prediction.scores = scores;
        Ok(prediction.clone())
    }

    async fn users(&self) -> Result<Vec<User>> {
        Ok(self.data.lock().await.users.values().cloned().collect())
    }

    async fn user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.data.lock().await.users.get(user_id).cloned())
    }

    async fn gameweek(&self, number: u32) -> Result<Gameweek> {
        Ok(self
            .data
            .lock()
            .await
            .gameweeks
            .get(&number)
            .cloned()
            .unwrap_or_else(|| Gameweek::new(number)))
    }

    async fn gameweeks(&self) -> Result<Vec<Gameweek>> {
        Ok(self.data.lock().await.gameweeks.values().cloned().collect())
    }

    async fn league(&self, league_id: &str) -> Result<Option<League>> {
        Ok(self.data.lock().await.leagues.get(league_id).cloned())
    }

    async fn save_league_schedule(
        &self,
        league_id: &str,
        status: LeagueStatus,
        fixtures: &FixtureTable,
    ) -> Result<()> {
        let mut data = self.data.lock().await;
        let league = data
            .leagues
            .get_mut(league_id)
            .ok_or_else(|| AppError::LeagueNotFound(league_id.to_string()))?;
        league.status = status;
        league.fixtures = fixtures.clone();
        Ok(())
    }

    async fn apply_finalization(
        &self,
        gameweek: u32,
        standings: &[GameweekStanding],
    ) -> Result<FinalizeOutcome> {
        let mut data = self.data.lock().await;
        let data = &mut *data;

        let record = data
            .gameweeks
            .entry(gameweek)
            .or_insert_with(|| Gameweek::new(gameweek));
        if record.is_finalized {
            return Ok(FinalizeOutcome::AlreadyFinalized);
        }

        let mut applied = BTreeMap::new();
        for standing in standings {
            let Some(user) = data.users.get_mut(&standing.user_id) else {
                continue;
            };
            user.total_score += standing.total_points;
            if let Some(prediction) = data
                .predictions
                .get_mut(&(gameweek, standing.user_id.clone()))
            {
                prediction.points = Some(standing.total_points);
            }
            applied.insert(standing.user_id.clone(), standing.total_points);
        }

        let outcome = FinalizeOutcome::Applied {
            users_credited: applied.len(),
            points_awarded: applied.values().sum(),
        };
        record.applied_points = applied;
        record.is_finalized = true;
        Ok(outcome)
    }

    async fn revert_finalization(&self, gameweek: u32) -> Result<RevertOutcome> {
        let mut data = self.data.lock().await;
        let data = &mut *data;

        let Some(record) = data.gameweeks.get_mut(&gameweek) else {
            return Ok(RevertOutcome::NotFinalized);
        };
        if !record.is_finalized {
            return Ok(RevertOutcome::NotFinalized);
        }

        let applied = std::mem::take(&mut record.applied_points);
        for (user_id, points) in &applied {
            if let Some(user) = data.users.get_mut(user_id) {
                user.total_score -= points;
            }
        }
        for prediction in data.predictions.values_mut() {
            if prediction.gameweek == gameweek {
                prediction.points = None;
            }
        }
        record.is_finalized = false;
        Ok(RevertOutcome::Reverted {
            users_debited: applied.len(),
        })
    }

    async fn recompute_totals(&self) -> Result<usize> {
        let mut data = self.data.lock().await;
        let data = &mut *data;

        let finalized: HashSet<u32> = data
            .gameweeks
            .values()
            .filter(|gw| gw.is_finalized)
            .map(|gw| gw.number)
            .collect();

        let mut totals: HashMap<&str, i64> = HashMap::new();
        for prediction in data.predictions.values() {
            if !finalized.contains(&prediction.gameweek) {
                continue;
            }
            if let Some(points) = prediction.points {
                *totals.entry(prediction.user_id.as_str()).or_default() += points;
            }
        }

        for user in data.users.values_mut() {
            user.total_score = totals.get(user.id.as_str()).copied().unwrap_or(0);
        }
        Ok(data.users.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standing(user: &str, points: i64) -> GameweekStanding {
        GameweekStanding {
            user_id: user.into(),
            total_points: points,
            exact_count: 0,
            correct_count: 0,
        }
    }

    #[tokio::test]
    async fn finalization_is_applied_once_and_reverted_exactly() {
        let store = MemoryStore::new();
        store.insert_user(User::new("alice", "Alice")).await;
        store.insert_prediction(Prediction::new(2, "alice")).await;

        let standings = vec![standing("alice", 4), standing("gone", 9)];
        let first = store.apply_finalization(2, &standings).await.unwrap();
        assert_eq!(
            first,
            FinalizeOutcome::Applied {
                users_credited: 1,
                points_awarded: 4
            }
        );
        let second = store.apply_finalization(2, &standings).await.unwrap();
        assert_eq!(second, FinalizeOutcome::AlreadyFinalized);

        assert_eq!(store.user("alice").await.unwrap().unwrap().total_score, 4);
        assert_eq!(store.prediction(2, "alice").await.unwrap().unwrap().points, Some(4));
        let gw = store.gameweek(2).await.unwrap();
        assert!(gw.is_finalized);
        assert_eq!(gw.applied_points.get("alice"), Some(&4));

        let reverted = store.revert_finalization(2).await.unwrap();
        assert_eq!(reverted, RevertOutcome::Reverted { users_debited: 1 });
        assert_eq!(store.user("alice").await.unwrap().unwrap().total_score, 0);
        assert_eq!(store.prediction(2, "alice").await.unwrap().unwrap().points, None);
        assert!(!store.gameweek(2).await.unwrap().is_finalized);

        assert_eq!(store.revert_finalization(2).await.unwrap(), RevertOutcome::NotFinalized);
    }

    #[tokio::test]
    async fn recompute_sums_frozen_points_of_finalized_weeks() {
        let store = MemoryStore::new();
        store.insert_user(User::new("alice", "Alice")).await;
        store.insert_user(User::new("carol", "Carol")).await;
        for gameweek in [1, 2] {
            store.insert_prediction(Prediction::new(gameweek, "alice")).await;
        }
        store.apply_finalization(1, &[standing("alice", 4)]).await.unwrap();
        store.apply_finalization(2, &[standing("alice", 6)]).await.unwrap();

        // stale points on an open gameweek do not count
        let mut open = Prediction::new(3, "alice");
        open.points = Some(50);
        store.insert_prediction(open).await;
        store.set_total("alice", -3).await;
        store.set_total("carol", 12).await;

        assert_eq!(store.recompute_totals().await.unwrap(), 2);
        assert_eq!(store.user("alice").await.unwrap().unwrap().total_score, 10);
        assert_eq!(store.user("carol").await.unwrap().unwrap().total_score, 0);
    }

    #[tokio::test]
    async fn saving_scores_keeps_frozen_points() {
        let store = MemoryStore::new();
        let mut prediction = Prediction::new(1, "bob");
        prediction.points = Some(7);
        store.insert_prediction(prediction).await;

        let scores = BTreeMap::from([("m1".to_string(), PredictedScore::new(1, 0))]);
        let saved = store.save_prediction_scores(1, "bob", scores).await.unwrap();
        assert_eq!(saved.points, Some(7));
        assert_eq!(saved.scores.len(), 1);
    }

    #[tokio::test]
    async fn unknown_league_schedule_write_fails() {
        let store = MemoryStore::new();
        let err = store
            .save_league_schedule("nope", LeagueStatus::Active, &FixtureTable::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LeagueNotFound(_)));
    }
}
