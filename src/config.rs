// config.rs
use std::env;
use std::str::FromStr;

use crate::errors::{AppError, Result};

pub const DEFAULT_TOTAL_GAMEWEEKS: u32 = 38;
pub const DEFAULT_BYE_PARTICIPANT_ID: &str = "AVERAGE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

/// Points awarded by the prediction scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringRules {
    pub exact_score: i64,
    pub correct_result: i64,
}

impl Default for ScoringRules {
    fn default() -> Self {
        ScoringRules {
            exact_score: 3,
            correct_result: 1,
        }
    }
}

/// Everything the engine needs to know about the running season. Passed
/// explicitly into each operation instead of living in module constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonConfig {
    pub season: String,
    pub total_gameweeks: u32,
    pub bye_participant_id: String,
    pub rules: ScoringRules,
    pub current_gameweek: Option<u32>,
}

impl Default for SeasonConfig {
    fn default() -> Self {
        SeasonConfig {
            season: "2025".to_string(),
            total_gameweeks: DEFAULT_TOTAL_GAMEWEEKS,
            bye_participant_id: DEFAULT_BYE_PARTICIPANT_ID.to_string(),
            rules: ScoringRules::default(),
            current_gameweek: None,
        }
    }
}

impl SeasonConfig {
    pub fn check_gameweek(&self, gameweek: u32) -> Result<u32> {
        if gameweek == 0 || gameweek > self.total_gameweeks {
            return Err(AppError::InvalidGameweek(gameweek));
        }
        Ok(gameweek)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub database_name: String,
    /// JSON document loaded into the in-memory store at startup.
    pub seed_file: Option<String>,
    pub host: String,
    pub port: u16,
    pub season: SeasonConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_backend = match lookup("STORE_BACKEND").as_deref() {
            None | Some("mongo") => StoreBackend::Mongo,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(AppError::configuration(format!(
                    "STORE_BACKEND must be 'mongo' or 'memory', got '{}'",
                    other
                )))
            }
        };

        let database_url = lookup("DATABASE_URL");
        if store_backend == StoreBackend::Mongo && database_url.is_none() {
            return Err(AppError::configuration(
                "DATABASE_URL must be set when STORE_BACKEND=mongo",
            ));
        }

        let defaults = SeasonConfig::default();
        let total_gameweeks = parse_or(&lookup, "TOTAL_GAMEWEEKS", defaults.total_gameweeks)?;
        if total_gameweeks == 0 {
            return Err(AppError::configuration("TOTAL_GAMEWEEKS must be at least 1"));
        }

        let current_gameweek = match lookup("CURRENT_GAMEWEEK") {
            Some(raw) => Some(parse_value::<u32>("CURRENT_GAMEWEEK", &raw)?),
            None => None,
        };

        let season = SeasonConfig {
            season: lookup("SEASON").unwrap_or(defaults.season),
            total_gameweeks,
            bye_participant_id: lookup("BYE_PARTICIPANT_ID")
                .unwrap_or(defaults.bye_participant_id),
            rules: ScoringRules {
                exact_score: parse_or(&lookup, "EXACT_SCORE_POINTS", defaults.rules.exact_score)?,
                correct_result: parse_or(
                    &lookup,
                    "CORRECT_RESULT_POINTS",
                    defaults.rules.correct_result,
                )?,
            },
            current_gameweek,
        };

        Ok(AppConfig {
            store_backend,
            database_url,
            database_name: lookup("DATABASE_NAME").unwrap_or_else(|| "predictor".to_string()),
            seed_file: lookup("SEED_FILE"),
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 10000)?,
            season,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::configuration(format!("{} must be a number, got '{}'", key, raw)))
}
