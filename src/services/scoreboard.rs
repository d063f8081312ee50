use std::collections::HashMap;

use serde::Serialize;

use crate::config::SeasonConfig;
use crate::database::Store;
use crate::engine::aggregator::sort_standings;
use crate::errors::{AppError, Result};
use crate::services::snapshot::GameweekSnapshot;

#[derive(Debug, Clone, Serialize)]
pub struct ScoreboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub display_name: String,
    pub points: i64,
    /// Live breakdown; absent once the gameweek is finalized, since only the
    /// point total is frozen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Scoreboard {
    pub gameweek: u32,
    pub is_finalized: bool,
    pub entries: Vec<ScoreboardEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Ranked points for one gameweek, optionally narrowed to a league. Once the
/// gameweek is finalized the frozen points are reported, not a recomputation.
pub async fn gameweek_scoreboard(
    store: &dyn Store,
    season: &SeasonConfig,
    gameweek: u32,
    league_id: Option<&str>,
) -> Result<Scoreboard> {
    season.check_gameweek(gameweek)?;
    let mut snapshot = GameweekSnapshot::load(store, gameweek).await?;

    if let Some(league_id) = league_id {
        let league = store
            .league(league_id)
            .await?
            .ok_or_else(|| AppError::LeagueNotFound(league_id.to_string()))?;
        snapshot.restrict_to(&league.members);
    }

    let mut standings = snapshot.standings(&season.rules);
    if snapshot.gameweek.is_finalized {
        let frozen: HashMap<&str, i64> = snapshot
            .predictions
            .iter()
            .filter_map(|p| p.points.map(|points| (p.user_id.as_str(), points)))
            .collect();
        for standing in standings.iter_mut() {
            if let Some(points) = frozen.get(standing.user_id.as_str()) {
                standing.total_points = *points;
            }
        }
        sort_standings(&mut standings);
    }

    let names: HashMap<String, String> = store
        .users()
        .await?
        .into_iter()
        .map(|u| (u.id, u.display_name))
        .collect();

    let message = if snapshot.matches.is_empty() {
        Some("Waiting for match data...".to_string())
    } else if standings.is_empty() {
        Some("No one has made predictions yet.".to_string())
    } else {
        None
    };

    let live = !snapshot.gameweek.is_finalized;
    let entries = standings
        .into_iter()
        .enumerate()
        .map(|(index, s)| ScoreboardEntry {
            rank: index + 1,
            display_name: names
                .get(&s.user_id)
                .filter(|n| !n.is_empty())
                .cloned()
                .unwrap_or_else(|| "Anonymous".to_string()),
            user_id: s.user_id,
            points: s.total_points,
            exact_count: live.then_some(s.exact_count),
            correct_count: live.then_some(s.correct_count),
        })
        .collect();

    Ok(Scoreboard {
        gameweek,
        is_finalized: snapshot.gameweek.is_finalized,
        entries,
        message,
    })
}
