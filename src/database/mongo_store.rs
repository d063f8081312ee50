use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, Bson, Document},
    error::{Error as MongoError, TRANSIENT_TRANSACTION_ERROR, UNKNOWN_TRANSACTION_COMMIT_RESULT},
    Client, ClientSession, Collection, Database,
};

use crate::database::{FinalizeOutcome, RevertOutcome, Store};
use crate::engine::aggregator::GameweekStanding;
use crate::errors::{AppError, Result};
use crate::models::gameweek::Gameweek;
use crate::models::league::{FixtureTable, League, LeagueStatus};
use crate::models::match_record::{Match, MatchCache, ScoreOverride};
use crate::models::prediction::{PredictedScore, Prediction};
use crate::models::user::User;

const MAX_TRANSACTION_ATTEMPTS: u32 = 5;

const MATCHES: &str = "matches_cache";
const OVERRIDES: &str = "score_overrides";
const PREDICTIONS: &str = "predictions";
const USERS: &str = "users";
const GAMEWEEKS: &str = "gameweeks";
const LEAGUES: &str = "leagues";

// Work that must commit as a single multi-document transaction
enum TxnOp<'a> {
    Finalize {
        gameweek: u32,
        standings: &'a [GameweekStanding],
    },
    Revert {
        gameweek: u32,
    },
    RecomputeTotals,
}

enum TxnOutput {
    Finalized(FinalizeOutcome),
    Reverted(RevertOutcome),
    Totals(usize),
}

#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    pub fn new(client: Client, db: Database) -> Self {
        MongoStore { client, db }
    }

    fn matches_cache(&self) -> Collection<MatchCache> {
        self.db.collection(MATCHES)
    }

    fn overrides(&self) -> Collection<ScoreOverride> {
        self.db.collection(OVERRIDES)
    }

    fn predictions_col(&self) -> Collection<Prediction> {
        self.db.collection(PREDICTIONS)
    }

    fn users_col(&self) -> Collection<User> {
        self.db.collection(USERS)
    }

    fn gameweeks_col(&self) -> Collection<Gameweek> {
        self.db.collection(GAMEWEEKS)
    }

    fn leagues_col(&self) -> Collection<League> {
        self.db.collection(LEAGUES)
    }

    /// Runs `op` inside a transaction, retrying the whole body on transient
    /// errors and the commit on an unknown commit result.
    async fn run_transaction(&self, op: TxnOp<'_>) -> Result<TxnOutput> {
        let mut session = self.client.start_session().await?;
        let mut attempt = 0;

        loop {
            attempt += 1;
            session.start_transaction().await?;

            let output = match self.execute(&mut session, &op).await {
                Ok(output) => output,
                Err(e) => {
                    if let Err(abort_err) = session.abort_transaction().await {
                        tracing::debug!("Abort after failed transaction body: {}", abort_err);
                    }
                    if e.contains_label(TRANSIENT_TRANSACTION_ERROR) && attempt < MAX_TRANSACTION_ATTEMPTS {
                        tracing::warn!("⚠️ Transaction conflict (attempt {}), retrying: {}", attempt, e);
                        continue;
                    }
                    return Err(e.into());
                }
            };

            match Self::commit(&mut session).await {
                Ok(()) => return Ok(output),
                Err(e) if e.contains_label(TRANSIENT_TRANSACTION_ERROR) && attempt < MAX_TRANSACTION_ATTEMPTS => {
                    tracing::warn!("⚠️ Commit conflict (attempt {}), retrying: {}", attempt, e);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn commit(session: &mut ClientSession) -> std::result::Result<(), MongoError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match session.commit_transaction().await {
                Err(e) if e.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT) && attempt < MAX_TRANSACTION_ATTEMPTS => {
                    tracing::warn!("Unknown commit result, retrying commit: {}", e);
                }
                other => return other,
            }
        }
    }

    async fn execute(
        &self,
        session: &mut ClientSession,
        op: &TxnOp<'_>,
    ) -> std::result::Result<TxnOutput, MongoError> {
        match op {
            TxnOp::Finalize { gameweek, standings } => self
                .finalize_in_session(session, *gameweek, standings)
                .await
                .map(TxnOutput::Finalized),
            TxnOp::Revert { gameweek } => self
                .revert_in_session(session, *gameweek)
                .await
                .map(TxnOutput::Reverted),
            TxnOp::RecomputeTotals => self
                .recompute_totals_in_session(session)
                .await
                .map(TxnOutput::Totals),
        }
    }

    async fn finalize_in_session(
        &self,
        session: &mut ClientSession,
        gameweek: u32,
        standings: &[GameweekStanding],
    ) -> std::result::Result<FinalizeOutcome, MongoError> {
        let gw_id = Gameweek::doc_id(gameweek);
        let current = self
            .gameweeks_col()
            .find_one(doc! { "_id": &gw_id })
            .session(&mut *session)
            .await?;
        if current.is_some_and(|gw| gw.is_finalized) {
            return Ok(FinalizeOutcome::AlreadyFinalized);
        }

        let mut applied = Document::new();
        let mut users_credited = 0;
        let mut points_awarded = 0;
        for standing in standings {
            let credited = self
                .users_col()
                .update_one(
                    doc! { "_id": &standing.user_id },
                    doc! { "$inc": { "total_score": standing.total_points } },
                )
                .session(&mut *session)
                .await?;
            if credited.matched_count == 0 {
                tracing::debug!("Skipping deleted user {}", standing.user_id);
                continue;
            }

            self.predictions_col()
                .update_one(
                    doc! { "_id": Prediction::doc_id(gameweek, &standing.user_id) },
                    doc! { "$set": { "points": standing.total_points } },
                )
                .session(&mut *session)
                .await?;

            applied.insert(standing.user_id.clone(), standing.total_points);
            users_credited += 1;
            points_awarded += standing.total_points;
        }

        // Every finalizer writes this document, so racing transactions conflict here
        self.gameweeks_col()
            .update_one(
                doc! { "_id": &gw_id },
                doc! { "$set": {
                    "number": i64::from(gameweek),
                    "is_finalized": true,
                    "applied_points": applied,
                } },
            )
            .upsert(true)
            .session(&mut *session)
            .await?;

        Ok(FinalizeOutcome::Applied {
            users_credited,
            points_awarded,
        })
    }

    async fn revert_in_session(
        &self,
        session: &mut ClientSession,
        gameweek: u32,
    ) -> std::result::Result<RevertOutcome, MongoError> {
        let gw_id = Gameweek::doc_id(gameweek);
        let current = self
            .gameweeks_col()
            .find_one(doc! { "_id": &gw_id })
            .session(&mut *session)
            .await?;
        let Some(record) = current.filter(|gw| gw.is_finalized) else {
            return Ok(RevertOutcome::NotFinalized);
        };

        for (user_id, points) in &record.applied_points {
            self.users_col()
                .update_one(
                    doc! { "_id": user_id },
                    doc! { "$inc": { "total_score": -points } },
                )
                .session(&mut *session)
                .await?;
        }

        self.predictions_col()
            .update_many(
                doc! { "gameweek": i64::from(gameweek) },
                doc! { "$set": { "points": Bson::Null } },
            )
            .session(&mut *session)
            .await?;

        self.gameweeks_col()
            .update_one(
                doc! { "_id": &gw_id },
                doc! { "$set": { "is_finalized": false, "applied_points": Document::new() } },
            )
            .session(&mut *session)
            .await?;

        Ok(RevertOutcome::Reverted {
            users_debited: record.applied_points.len(),
        })
    }

    async fn recompute_totals_in_session(
        &self,
        session: &mut ClientSession,
    ) -> std::result::Result<usize, MongoError> {
        // reads go through the session so a concurrent finalize conflicts
        let mut cursor = self
            .gameweeks_col()
            .find(doc! { "is_finalized": true })
            .session(&mut *session)
            .await?;
        let finalized: Vec<Gameweek> = cursor.stream(&mut *session).try_collect().await?;
        let numbers: Vec<i64> = finalized.iter().map(|gw| i64::from(gw.number)).collect();

        let mut cursor = self
            .predictions_col()
            .find(doc! {
                "gameweek": { "$in": numbers },
                "points": { "$ne": Bson::Null },
            })
            .session(&mut *session)
            .await?;
        let frozen: Vec<Prediction> = cursor.stream(&mut *session).try_collect().await?;

        let mut totals: HashMap<String, i64> = HashMap::new();
        for prediction in frozen {
            if let Some(points) = prediction.points {
                *totals.entry(prediction.user_id).or_default() += points;
            }
        }

        let reset = self
            .users_col()
            .update_many(doc! {}, doc! { "$set": { "total_score": 0_i64 } })
            .session(&mut *session)
            .await?;

        for (user_id, total) in &totals {
            self.users_col()
                .update_one(
                    doc! { "_id": user_id },
                    doc! { "$set": { "total_score": *total } },
                )
                .session(&mut *session)
                .await?;
        }

        Ok(reset.matched_count as usize)
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn ping(&self) -> Result<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn matches(&self, gameweek: u32) -> Result<Vec<Match>> {
        let cache = self
            .matches_cache()
            .find_one(doc! { "_id": MatchCache::doc_id(gameweek) })
            .await?;
        Ok(cache.map(|c| c.matches).unwrap_or_default())
    }

    async fn all_matches(&self) -> Result<BTreeMap<u32, Vec<Match>>> {
        let cursor = self.matches_cache().find(doc! {}).await?;
        let caches: Vec<MatchCache> = cursor.try_collect().await?;
        Ok(caches.into_iter().map(|c| (c.gameweek, c.matches)).collect())
    }

    async fn replace_matches(&self, gameweek: u32, matches: Vec<Match>) -> Result<()> {
        let cache = MatchCache {
            id: MatchCache::doc_id(gameweek),
            gameweek,
            matches,
            last_updated: Utc::now(),
        };
        self.matches_cache()
            .replace_one(doc! { "_id": &cache.id }, &cache)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn score_overrides(&self, gameweek: u32) -> Result<Vec<ScoreOverride>> {
        let cursor = self
            .overrides()
            .find(doc! { "gameweek": i64::from(gameweek) })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn predictions(&self, gameweek: u32) -> Result<Vec<Prediction>> {
        let cursor = self
            .predictions_col()
            .find(doc! { "gameweek": i64::from(gameweek) })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn prediction(&self, gameweek: u32, user_id: &str) -> Result<Option<Prediction>> {
        Ok(self
            .predictions_col()
            .find_one(doc! { "_id": Prediction::doc_id(gameweek, user_id) })
            .await?)
    }

    async fn save_prediction_scores(
        &self,
        gameweek: u32,
        user_id: &str,
        scores: BTreeMap<String, PredictedScore>,
    ) -> Result<Prediction> {
        let id = Prediction::doc_id(gameweek, user_id);
        self.predictions_col()
            .update_one(
                doc! { "_id": &id },
                doc! { "$set": {
                    "gameweek": i64::from(gameweek),
                    "user_id": user_id,
                    "scores": to_bson(&scores)?,
                } },
            )
            .upsert(true)
            .await?;

        self.predictions_col()
            .find_one(doc! { "_id": &id })
            .await?
            .ok_or_else(|| AppError::storage(format!("prediction {} missing after upsert", id)))
    }

    async fn users(&self) -> Result<Vec<User>> {
        let cursor = self.users_col().find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.users_col().find_one(doc! { "_id": user_id }).await?)
    }

    async fn gameweek(&self, number: u32) -> Result<Gameweek> {
        let found = self
            .gameweeks_col()
            .find_one(doc! { "_id": Gameweek::doc_id(number) })
            .await?;
        Ok(found.unwrap_or_else(|| Gameweek::new(number)))
    }

    async fn gameweeks(&self) -> Result<Vec<Gameweek>> {
        let cursor = self.gameweeks_col().find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn league(&self, league_id: &str) -> Result<Option<League>> {
        Ok(self.leagues_col().find_one(doc! { "_id": league_id }).await?)
    }

    async fn save_league_schedule(
        &self,
        league_id: &str,
        status: LeagueStatus,
        fixtures: &FixtureTable,
    ) -> Result<()> {
        let result = self
            .leagues_col()
            .update_one(
                doc! { "_id": league_id },
                doc! { "$set": {
                    "status": to_bson(&status)?,
                    "fixtures": to_bson(fixtures)?,
                } },
            )
            .await?;
        if result.matched_count == 0 {
            return Err(AppError::LeagueNotFound(league_id.to_string()));
        }
        Ok(())
    }

    async fn apply_finalization(
        &self,
        gameweek: u32,
        standings: &[GameweekStanding],
    ) -> Result<FinalizeOutcome> {
        match self
            .run_transaction(TxnOp::Finalize { gameweek, standings })
            .await?
        {
            TxnOutput::Finalized(outcome) => Ok(outcome),
            _ => Err(AppError::storage("finalize transaction returned the wrong output")),
        }
    }

    async fn revert_finalization(&self, gameweek: u32) -> Result<RevertOutcome> {
        match self.run_transaction(TxnOp::Revert { gameweek }).await? {
            TxnOutput::Reverted(outcome) => Ok(outcome),
            _ => Err(AppError::storage("revert transaction returned the wrong output")),
        }
    }

    async fn recompute_totals(&self) -> Result<usize> {
        match self.run_transaction(TxnOp::RecomputeTotals).await? {
            TxnOutput::Totals(count) => Ok(count),
            _ => Err(AppError::storage("totals transaction returned the wrong output")),
        }
    }
}
