use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::config::ScoringRules;
use crate::engine::scorer::{score_prediction, Hit};
use crate::models::match_record::{Match, ScoreLine, ScoreOverride};
use crate::models::prediction::Prediction;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameweekStanding {
    pub user_id: String,
    pub total_points: i64,
    pub exact_count: u32,
    pub correct_count: u32,
}

/// Final scorelines keyed by match id. Only finished matches with a complete
/// score make it in; an override replaces the cached score.
pub fn result_lookup(matches: &[Match], overrides: &[ScoreOverride]) -> HashMap<String, ScoreLine> {
    let overrides: HashMap<&str, ScoreLine> = overrides
        .iter()
        .map(|o| (o.match_id.as_str(), o.score()))
        .collect();

    matches
        .iter()
        .filter(|m| m.status.is_finished())
        .filter_map(|m| {
            overrides
                .get(m.id.as_str())
                .copied()
                .or(m.score)
                .map(|score| (m.id.clone(), score))
        })
        .collect()
}

pub fn score_user(
    prediction: &Prediction,
    results: &HashMap<String, ScoreLine>,
    rules: &ScoringRules,
) -> GameweekStanding {
    let mut standing = GameweekStanding {
        user_id: prediction.user_id.clone(),
        total_points: 0,
        exact_count: 0,
        correct_count: 0,
    };

    for (match_id, predicted) in &prediction.scores {
        let (Some(predicted), Some(actual)) = (predicted.scoreline(), results.get(match_id)) else {
            continue;
        };
        let scored = score_prediction(predicted, *actual, rules);
        standing.total_points += scored.points;
        match scored.hit {
            Hit::Exact => standing.exact_count += 1,
            Hit::CorrectResult => standing.correct_count += 1,
            Hit::Miss => {}
        }
    }

    standing
}

/// Rank every valid user who submitted a prediction for the gameweek.
/// Ordered by points, highest first, then by user id.
pub fn aggregate_gameweek(
    matches: &[Match],
    overrides: &[ScoreOverride],
    predictions: &[Prediction],
    valid_users: &HashSet<String>,
    rules: &ScoringRules,
) -> Vec<GameweekStanding> {
    let results = result_lookup(matches, overrides);

    let mut standings: Vec<GameweekStanding> = predictions
        .iter()
        .filter(|p| valid_users.contains(&p.user_id))
        .map(|p| score_user(p, &results, rules))
        .collect();

    sort_standings(&mut standings);
    standings
}

pub fn sort_standings(standings: &mut [GameweekStanding]) {
    standings.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
}
