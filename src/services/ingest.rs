use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::SeasonConfig;
use crate::database::Store;
use crate::errors::Result;
use crate::models::match_record::{Match, MatchStatus, ScoreLine};

/// One entry of the upstream football feed, as delivered.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMatch {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub home_team: String,
    #[serde(default)]
    pub away_team: String,
    #[serde(default)]
    pub utc_date: Option<String>,
    /// Kickoff in epoch milliseconds.
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub score: Option<RawScore>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawScore {
    #[serde(default)]
    pub full_time: Option<RawFullTime>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFullTime {
    #[serde(default)]
    pub home: Value,
    #[serde(default)]
    pub away: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub gameweek: u32,
    pub accepted: usize,
    pub rejected: Vec<String>,
}

fn parse_status(raw: &str) -> Option<MatchStatus> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "SCHEDULED" | "POSTPONED" | "SUSPENDED" | "CANCELLED" => Some(MatchStatus::Scheduled),
        "TIMED" => Some(MatchStatus::Timed),
        "IN_PLAY" | "LIVE" | "EXTRA_TIME" | "PENALTY_SHOOTOUT" => Some(MatchStatus::InPlay),
        "PAUSED" => Some(MatchStatus::Paused),
        "FINISHED" | "AWARDED" => Some(MatchStatus::Finished),
        _ => None,
    }
}

fn parse_id(raw: &Value) -> Option<String> {
    let id = match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!id.is_empty()).then_some(id)
}

fn parse_goals(raw: &Value) -> Option<u32> {
    raw.as_u64().and_then(|g| u32::try_from(g).ok())
}

fn parse_kickoff(raw: &RawMatch) -> Option<DateTime<Utc>> {
    if let Some(date) = raw.utc_date.as_deref() {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(date) {
            return Some(parsed.with_timezone(&Utc));
        }
    }
    raw.timestamp
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

fn normalize(raw: &RawMatch) -> std::result::Result<Match, String> {
    let id = parse_id(&raw.id).ok_or_else(|| "missing id".to_string())?;
    let kickoff = parse_kickoff(raw).ok_or_else(|| format!("{}: no kickoff time", id))?;
    // an unrecognized status must still hold the gameweek open
    let status = parse_status(&raw.status).unwrap_or_else(|| {
        tracing::warn!(
            "⚠️ Match {} has unknown status '{}', treating it as paused",
            id,
            raw.status
        );
        MatchStatus::Paused
    });

    let score = raw
        .score
        .as_ref()
        .and_then(|s| s.full_time.as_ref())
        .and_then(|ft| Some(ScoreLine::new(parse_goals(&ft.home)?, parse_goals(&ft.away)?)));

    Ok(Match {
        id,
        home_team: raw.home_team.clone(),
        away_team: raw.away_team.clone(),
        kickoff,
        status,
        score,
    })
}

/// Turn feed entries into typed matches. Entries without an id or kickoff
/// are dropped and their reasons returned.
pub fn normalize_matches(raw: &[RawMatch]) -> (Vec<Match>, Vec<String>) {
    let mut matches = Vec::with_capacity(raw.len());
    let mut rejected = Vec::new();

    for entry in raw {
        match normalize(entry) {
            Ok(m) => matches.push(m),
            Err(reason) => {
                tracing::warn!("⚠️ Skipping feed entry: {}", reason);
                rejected.push(reason);
            }
        }
    }
    (matches, rejected)
}

/// Replace a gameweek's match cache with the normalized feed.
pub async fn ingest_matches(
    store: &dyn Store,
    season: &SeasonConfig,
    gameweek: u32,
    raw: &[RawMatch],
) -> Result<IngestReport> {
    season.check_gameweek(gameweek)?;
    let (matches, rejected) = normalize_matches(raw);
    let accepted = matches.len();

    store.replace_matches(gameweek, matches).await?;
    tracing::info!(
        "📥 Gameweek {} match cache refreshed: {} accepted, {} rejected",
        gameweek,
        accepted,
        rejected.len()
    );

    Ok(IngestReport {
        gameweek,
        accepted,
        rejected,
    })
}
