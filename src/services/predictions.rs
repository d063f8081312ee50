use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::config::SeasonConfig;
use crate::database::Store;
use crate::errors::{AppError, Result};
use crate::models::match_record::Match;
use crate::models::prediction::{PredictedScore, Prediction};

/// Store a user's picks for a gameweek. Picks for matches that have kicked off
/// can no longer change; resubmitting the same value is accepted.
pub async fn submit_prediction(
    store: &dyn Store,
    season: &SeasonConfig,
    gameweek: u32,
    user_id: &str,
    scores: BTreeMap<String, PredictedScore>,
    now: DateTime<Utc>,
) -> Result<Prediction> {
    season.check_gameweek(gameweek)?;

    if store.gameweek(gameweek).await?.is_finalized {
        return Err(AppError::GameweekFinalized(gameweek));
    }
    if store.user(user_id).await?.is_none() {
        return Err(AppError::UserNotFound(user_id.to_string()));
    }

    let matches = store.matches(gameweek).await?;
    let by_id: HashMap<&str, &Match> = matches.iter().map(|m| (m.id.as_str(), m)).collect();
    let existing = store.prediction(gameweek, user_id).await?;
    let previous = existing.as_ref().map(|p| &p.scores);

    let mut locked = Vec::new();
    for (match_id, score) in &scores {
        let Some(game) = by_id.get(match_id.as_str()) else {
            return Err(AppError::invalid_data(format!(
                "Match {} is not part of gameweek {}",
                match_id, gameweek
            )));
        };
        if score.scoreline().is_none() {
            return Err(AppError::invalid_data(format!(
                "Prediction for match {} must be two non-negative whole numbers",
                match_id
            )));
        }
        let unchanged = previous
            .and_then(|p| p.get(match_id))
            .is_some_and(|old| old == score);
        if game.is_locked(now) && !unchanged {
            locked.push(match_id.clone());
        }
    }
    if !locked.is_empty() {
        return Err(AppError::PredictionsLocked(locked.join(", ")));
    }

    let mut merged = existing.map(|p| p.scores).unwrap_or_default();
    merged.extend(scores);

    let saved = store.save_prediction_scores(gameweek, user_id, merged).await?;
    tracing::info!(
        "📝 Saved {} picks for {} in gameweek {}",
        saved.scores.len(),
        user_id,
        gameweek
    );
    Ok(saved)
}
