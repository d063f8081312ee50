use std::sync::Arc;

use serde::Serialize;

use crate::config::SeasonConfig;
use crate::database::{FinalizeOutcome, RevertOutcome, Store};
use crate::engine::finalization::{readiness, Readiness};
use crate::errors::Result;
use crate::services::snapshot::GameweekSnapshot;

#[derive(Debug, Clone, Serialize)]
pub struct FinalizationStatus {
    pub gameweek: u32,
    pub is_finalized: bool,
    pub readiness: Readiness,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalizeReport {
    pub gameweek: u32,
    pub readiness: Readiness,
    /// `None` when the gameweek was not eligible and nothing was attempted.
    pub outcome: Option<FinalizeOutcome>,
}

/// Decides when a gameweek may be locked in and commits it exactly once.
#[derive(Clone)]
pub struct FinalizationController {
    store: Arc<dyn Store>,
    season: Arc<SeasonConfig>,
}

impl FinalizationController {
    pub fn new(store: Arc<dyn Store>, season: Arc<SeasonConfig>) -> Self {
        FinalizationController { store, season }
    }

    pub async fn status(&self, gameweek: u32) -> Result<FinalizationStatus> {
        self.season.check_gameweek(gameweek)?;
        let snapshot = GameweekSnapshot::load(self.store.as_ref(), gameweek).await?;
        let standings = snapshot.standings(&self.season.rules);
        let readiness = readiness(&snapshot.gameweek, &snapshot.matches, &standings);

        Ok(FinalizationStatus {
            gameweek,
            is_finalized: snapshot.gameweek.is_finalized,
            message: readiness.message(),
            readiness,
        })
    }

    /// Safe to call from any number of observers at once: the store re-checks
    /// the flag inside its transaction and at most one caller applies.
    pub async fn finalize(&self, gameweek: u32) -> Result<FinalizeReport> {
        self.season.check_gameweek(gameweek)?;
        let snapshot = GameweekSnapshot::load(self.store.as_ref(), gameweek).await?;
        let standings = snapshot.standings(&self.season.rules);
        let readiness = readiness(&snapshot.gameweek, &snapshot.matches, &standings);

        if !readiness.is_ready() {
            tracing::debug!("Gameweek {} not finalized: {}", gameweek, readiness.message());
            return Ok(FinalizeReport {
                gameweek,
                readiness,
                outcome: None,
            });
        }

        tracing::info!("🔒 Finalizing gameweek {} for {} users", gameweek, standings.len());
        let outcome = self
            .store
            .apply_finalization(gameweek, &standings)
            .await
            .map_err(|e| {
                tracing::error!("❌ Finalization of gameweek {} rolled back: {}", gameweek, e);
                e
            })?;

        match &outcome {
            FinalizeOutcome::Applied {
                users_credited,
                points_awarded,
            } => tracing::info!(
                "✅ Gameweek {} finalized: {} users credited, {} points",
                gameweek,
                users_credited,
                points_awarded
            ),
            FinalizeOutcome::AlreadyFinalized => {
                tracing::info!("Gameweek {} was finalized by another caller", gameweek)
            }
        }

        Ok(FinalizeReport {
            gameweek,
            readiness,
            outcome: Some(outcome),
        })
    }

    /// Reopen a gameweek, taking back exactly the points its finalization
    /// added so a later re-finalization does not double count.
    pub async fn unfinalize(&self, gameweek: u32) -> Result<RevertOutcome> {
        self.season.check_gameweek(gameweek)?;
        let outcome = self.store.revert_finalization(gameweek).await?;
        tracing::info!("↩️ Unfinalize gameweek {}: {:?}", gameweek, outcome);
        Ok(outcome)
    }

    /// Rebuild every user's total from the frozen points of finalized gameweeks.
    pub async fn recompute_totals(&self) -> Result<usize> {
        let updated = self.store.recompute_totals().await?;
        tracing::info!("🔄 Recalculated totals for {} users", updated);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_store::MemoryStore;
    use crate::models::match_record::{Match, MatchStatus, ScoreLine};
    use crate::models::prediction::Prediction;
    use crate::models::user::User;
    use chrono::{Duration, Utc};

    fn finished(id: &str, home: u32, away: u32) -> Match {
        Match {
            id: id.into(),
            home_team: "H".into(),
            away_team: "A".into(),
            kickoff: Utc::now() - Duration::days(2),
            status: MatchStatus::Finished,
            score: Some(ScoreLine::new(home, away)),
        }
    }

    async fn seeded() -> (Arc<MemoryStore>, FinalizationController) {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(User::new("alice", "Alice")).await;
        store.insert_user(User::new("bob", "Bob")).await;
        store
            .replace_matches(
                3,
                vec![finished("m1", 2, 1), finished("m2", 0, 0), finished("m3", 1, 3)],
            )
            .await
            .unwrap();
        store
            .insert_prediction(
                Prediction::new(3, "alice")
                    .with_score("m1", 2, 1)
                    .with_score("m2", 1, 1)
                    .with_score("m3", 0, 1),
            )
            .await;
        store
            .insert_prediction(Prediction::new(3, "bob").with_score("m1", 0, 2))
            .await;

        let controller =
            FinalizationController::new(store.clone(), Arc::new(SeasonConfig::default()));
        (store, controller)
    }

    async fn total(store: &MemoryStore, id: &str) -> i64 {
        store.user(id).await.unwrap().unwrap().total_score
    }

    #[tokio::test]
    async fn finalizes_once_then_no_ops() {
        let (store, controller) = seeded().await;

        let report = controller.finalize(3).await.unwrap();
        assert_eq!(report.readiness, Readiness::Ready);
        assert_eq!(
            report.outcome,
            Some(FinalizeOutcome::Applied {
                users_credited: 2,
                points_awarded: 5
            })
        );
        assert_eq!(total(&store, "alice").await, 5);
        assert_eq!(total(&store, "bob").await, 0);
        assert_eq!(store.prediction(3, "alice").await.unwrap().unwrap().points, Some(5));
        assert_eq!(store.prediction(3, "bob").await.unwrap().unwrap().points, Some(0));

        let again = controller.finalize(3).await.unwrap();
        assert_eq!(again.readiness, Readiness::AlreadyFinalized);
        assert_eq!(again.outcome, None);
        assert_eq!(total(&store, "alice").await, 5);

        let status = controller.status(3).await.unwrap();
        assert!(status.is_finalized);
    }

    #[tokio::test]
    async fn concurrent_attempts_credit_exactly_once() {
        let (store, controller) = seeded().await;

        let mut handles = Vec::new();
        for _ in 0..16 {
            let controller = controller.clone();
            handles.push(tokio::spawn(async move { controller.finalize(3).await }));
        }

        let mut applied = 0;
        for handle in handles {
            let report = handle.await.unwrap().unwrap();
            if matches!(report.outcome, Some(FinalizeOutcome::Applied { .. })) {
                applied += 1;
            }
        }

        assert_eq!(applied, 1);
        assert_eq!(total(&store, "alice").await, 5);
        assert_eq!(total(&store, "bob").await, 0);
    }

    #[tokio::test]
    async fn waits_for_every_match_and_a_prediction() {
        let (store, controller) = seeded().await;
        let mut matches = store.matches(3).await.unwrap();
        matches[1].status = MatchStatus::InPlay;
        store.replace_matches(3, matches).await.unwrap();

        let report = controller.finalize(3).await.unwrap();
        assert_eq!(report.readiness, Readiness::MatchesPending { remaining: 1 });
        assert!(report.outcome.is_none());
        assert!(!store.gameweek(3).await.unwrap().is_finalized);

        store.replace_matches(4, vec![finished("x", 1, 0)]).await.unwrap();
        let report = controller.finalize(4).await.unwrap();
        assert_eq!(report.readiness, Readiness::NoPredictions);

        let report = controller.finalize(5).await.unwrap();
        assert_eq!(report.readiness, Readiness::NoMatches);
    }

    #[tokio::test]
    async fn unfinalize_rolls_back_and_refinalize_does_not_double_count() {
        let (store, controller) = seeded().await;
        controller.finalize(3).await.unwrap();
        assert_eq!(total(&store, "alice").await, 5);

        let reverted = controller.unfinalize(3).await.unwrap();
        assert_eq!(reverted, RevertOutcome::Reverted { users_debited: 2 });
        assert_eq!(total(&store, "alice").await, 0);
        assert_eq!(store.prediction(3, "alice").await.unwrap().unwrap().points, None);

        controller.finalize(3).await.unwrap();
        assert_eq!(total(&store, "alice").await, 5);
    }

    #[tokio::test]
    async fn recompute_uses_frozen_points_only() {
        let (store, controller) = seeded().await;
        controller.finalize(3).await.unwrap();

        // a later score correction must not rewrite history
        store.replace_matches(3, vec![finished("m1", 0, 2)]).await.unwrap();
        store.set_total("alice", 0).await;
        assert_eq!(total(&store, "alice").await, 0);

        let updated = controller.recompute_totals().await.unwrap();
        assert_eq!(updated, 2);
        assert_eq!(total(&store, "alice").await, 5);
        assert_eq!(total(&store, "bob").await, 0);
    }

    #[tokio::test]
    async fn recompute_racing_finalize_keeps_the_credit() {
        for _ in 0..20 {
            let (store, controller) = seeded().await;

            let finalizer = controller.clone();
            let finalize = tokio::spawn(async move { finalizer.finalize(3).await });
            let recompute = tokio::spawn({
                let controller = controller.clone();
                async move { controller.recompute_totals().await }
            });
            finalize.await.unwrap().unwrap();
            recompute.await.unwrap().unwrap();

            assert!(store.gameweek(3).await.unwrap().is_finalized);
            assert_eq!(store.prediction(3, "alice").await.unwrap().unwrap().points, Some(5));
            assert_eq!(total(&store, "alice").await, 5);
        }
    }

    #[tokio::test]
    async fn deleted_users_are_not_credited() {
        let (store, controller) = seeded().await;
        store.remove_user("bob").await;

        let report = controller.finalize(3).await.unwrap();
        assert_eq!(
            report.outcome,
            Some(FinalizeOutcome::Applied {
                users_credited: 1,
                points_awarded: 5
            })
        );
        assert_eq!(store.prediction(3, "bob").await.unwrap().unwrap().points, None);
    }

    #[tokio::test]
    async fn rejects_out_of_season_gameweeks() {
        let (_, controller) = seeded().await;
        assert!(controller.finalize(0).await.is_err());
        assert!(controller.status(39).await.is_err());
    }
}
