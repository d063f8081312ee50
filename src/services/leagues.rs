use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::config::SeasonConfig;
use crate::database::Store;
use crate::engine::classic::{classic_standings, ClassicRow};
use crate::engine::h2h::{h2h_standings, H2hRecord, RoundPoints};
use crate::engine::schedule::{generate_fixtures, regenerate_from};
use crate::errors::{AppError, Result};
use crate::models::league::{Fixture, League, LeagueStatus, LeagueType};
use crate::services::calendar::resolve_current_gameweek;

const BYE_DISPLAY_NAME: &str = "👻 Average Bot";

#[derive(Debug, Clone, Serialize)]
pub struct H2hRow {
    pub rank: usize,
    pub display_name: String,
    #[serde(flatten)]
    pub record: H2hRecord,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum LeagueTable {
    Classic {
        league_id: String,
        rows: Vec<ClassicRow>,
    },
    HeadToHead {
        league_id: String,
        current_gameweek: u32,
        rows: Vec<H2hRow>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundFixtures {
    pub league_id: String,
    pub gameweek: u32,
    pub fixtures: Vec<Fixture>,
}

async fn load_league(store: &dyn Store, league_id: &str) -> Result<League> {
    store
        .league(league_id)
        .await?
        .ok_or_else(|| AppError::LeagueNotFound(league_id.to_string()))
}

/// Lock the member list and, for head-to-head leagues, write the season's
/// fixtures.
pub async fn start_league(store: &dyn Store, season: &SeasonConfig, league_id: &str) -> Result<League> {
    let mut league = load_league(store, league_id).await?;
    if league.status == LeagueStatus::Active {
        return Err(AppError::invalid_data(format!("League {} already started", league_id)));
    }
    if league.members.len() < 2 {
        return Err(AppError::invalid_data("Need at least 2 players to start"));
    }

    if league.league_type == LeagueType::HeadToHead {
        league.fixtures = generate_fixtures(&league.members, season)?;
    }
    league.status = LeagueStatus::Active;
    store
        .save_league_schedule(league_id, league.status, &league.fixtures)
        .await?;

    tracing::info!(
        "🏁 League {} started with {} members",
        league_id,
        league.members.len()
    );
    Ok(league)
}

/// Replace fixtures from `from_gameweek` onward for the current members.
pub async fn regenerate_fixtures(
    store: &dyn Store,
    season: &SeasonConfig,
    league_id: &str,
    from_gameweek: u32,
) -> Result<League> {
    let mut league = load_league(store, league_id).await?;
    if league.league_type != LeagueType::HeadToHead {
        return Err(AppError::invalid_data("Only head-to-head leagues have fixtures"));
    }

    league.fixtures = regenerate_from(&league.fixtures, &league.members, from_gameweek, season)?;
    store
        .save_league_schedule(league_id, league.status, &league.fixtures)
        .await?;

    tracing::info!(
        "🔁 League {} fixtures regenerated from gameweek {}",
        league_id,
        from_gameweek
    );
    Ok(league)
}

pub async fn round_fixtures(
    store: &dyn Store,
    season: &SeasonConfig,
    league_id: &str,
    gameweek: u32,
) -> Result<RoundFixtures> {
    season.check_gameweek(gameweek)?;
    let league = load_league(store, league_id).await?;
    Ok(RoundFixtures {
        league_id: league.id,
        gameweek,
        fixtures: league.fixtures.round(gameweek).to_vec(),
    })
}

pub async fn league_table(
    store: &dyn Store,
    season: &SeasonConfig,
    league_id: &str,
    requested_gameweek: Option<u32>,
) -> Result<LeagueTable> {
    let league = load_league(store, league_id).await?;
    let users: HashMap<String, _> = store
        .users()
        .await?
        .into_iter()
        .map(|u| (u.id.clone(), u))
        .collect();

    match league.league_type {
        LeagueType::Classic => Ok(LeagueTable::Classic {
            rows: classic_standings(&league.members, &users),
            league_id: league.id,
        }),
        LeagueType::HeadToHead => {
            let current_gameweek =
                resolve_current_gameweek(store, season, requested_gameweek).await?;

            let finalized: HashSet<u32> = store
                .gameweeks()
                .await?
                .into_iter()
                .filter(|gw| gw.is_finalized && gw.number < current_gameweek)
                .map(|gw| gw.number)
                .collect();

            // frozen points only; live scores never feed the table
            let mut persisted: BTreeMap<u32, RoundPoints> = BTreeMap::new();
            for gameweek in &finalized {
                let round = store
                    .predictions(*gameweek)
                    .await?
                    .into_iter()
                    .filter_map(|p| p.points.map(|points| (p.user_id, points)))
                    .collect();
                persisted.insert(*gameweek, round);
            }

            let records = h2h_standings(
                &league.members,
                &league.fixtures,
                &finalized,
                &persisted,
                current_gameweek,
                &season.bye_participant_id,
            );

            let rows = records
                .into_iter()
                .enumerate()
                .map(|(index, record)| H2hRow {
                    rank: index + 1,
                    display_name: if record.is_bye {
                        BYE_DISPLAY_NAME.to_string()
                    } else {
                        users
                            .get(&record.participant_id)
                            .map(|u| u.display_name.clone())
                            .unwrap_or_else(|| "Unknown".to_string())
                    },
                    record,
                })
                .collect();

            Ok(LeagueTable::HeadToHead {
                league_id: league.id,
                current_gameweek,
                rows,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_store::MemoryStore;
    use crate::engine::aggregator::GameweekStanding;
    use crate::models::league::FixtureTable;
    use crate::models::prediction::Prediction;
    use crate::models::user::User;

    fn league(id: &str, league_type: LeagueType, members: &[&str]) -> League {
        League {
            id: id.into(),
            name: id.to_uppercase(),
            league_type,
            members: members.iter().map(|m| m.to_string()).collect(),
            status: LeagueStatus::Recruiting,
            fixtures: FixtureTable::default(),
        }
    }

    fn standing(user: &str, points: i64) -> GameweekStanding {
        GameweekStanding {
            user_id: user.into(),
            total_points: points,
            exact_count: 0,
            correct_count: 0,
        }
    }

    async fn finalize_round(store: &MemoryStore, gameweek: u32, points: &[(&str, i64)]) {
        for (user, _) in points {
            store.insert_prediction(Prediction::new(gameweek, *user)).await;
        }
        let standings: Vec<GameweekStanding> =
            points.iter().map(|(u, p)| standing(u, *p)).collect();
        store.apply_finalization(gameweek, &standings).await.unwrap();
    }

    #[tokio::test]
    async fn starting_h2h_league_writes_fixtures() {
        let store = MemoryStore::new();
        store
            .insert_league(league("h", LeagueType::HeadToHead, &["a", "b", "c"]))
            .await;
        let season = SeasonConfig::default();

        let started = start_league(&store, &season, "h").await.unwrap();
        assert_eq!(started.status, LeagueStatus::Active);
        assert_eq!(started.fixtures.round(1).len(), 2);
        assert_eq!(started.fixtures.round(38).len(), 2);

        let stored = store.league("h").await.unwrap().unwrap();
        assert_eq!(stored.fixtures, started.fixtures);

        let again = start_league(&store, &season, "h").await;
        assert!(matches!(again, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn classic_league_needs_two_members_and_gets_no_fixtures() {
        let store = MemoryStore::new();
        store.insert_league(league("solo", LeagueType::Classic, &["a"])).await;
        store
            .insert_league(league("duo", LeagueType::Classic, &["a", "b"]))
            .await;
        let season = SeasonConfig::default();

        assert!(start_league(&store, &season, "solo").await.is_err());
        let duo = start_league(&store, &season, "duo").await.unwrap();
        assert!(duo.fixtures.is_empty());
        assert!(regenerate_fixtures(&store, &season, "duo", 3).await.is_err());
    }

    #[tokio::test]
    async fn regenerate_preserves_earlier_rounds() {
        let store = MemoryStore::new();
        store
            .insert_league(league("h", LeagueType::HeadToHead, &["a", "b", "c", "d"]))
            .await;
        let season = SeasonConfig::default();
        let started = start_league(&store, &season, "h").await.unwrap();

        let regenerated = regenerate_fixtures(&store, &season, "h", 6).await.unwrap();
        for gw in 1..6 {
            assert_eq!(regenerated.fixtures.round(gw), started.fixtures.round(gw));
        }
        assert_eq!(regenerated.fixtures.round(6), started.fixtures.round(1));

        let fixtures = round_fixtures(&store, &season, "h", 6).await.unwrap();
        assert_eq!(fixtures.fixtures.len(), 2);
    }

    #[tokio::test]
    async fn h2h_table_replays_frozen_rounds_only() {
        let store = MemoryStore::new();
        for id in ["a", "b"] {
            store.insert_user(User::new(id, id.to_uppercase())).await;
        }
        let mut h = league("h", LeagueType::HeadToHead, &["a", "b"]);
        let mut fixtures = FixtureTable::default();
        for gw in 1..=3 {
            fixtures.set_round(gw, vec![Fixture::new("a", "b")]);
        }
        h.fixtures = fixtures;
        h.status = LeagueStatus::Active;
        store.insert_league(h).await;

        finalize_round(&store, 1, &[("a", 5), ("b", 3)]).await;
        finalize_round(&store, 2, &[("a", 4), ("b", 4)]).await;
        // gameweek 3 has predictions but is still open
        store.insert_prediction(Prediction::new(3, "b")).await;

        let season = SeasonConfig::default();
        let table = league_table(&store, &season, "h", Some(4)).await.unwrap();
        let LeagueTable::HeadToHead { rows, current_gameweek, .. } = table else {
            panic!("expected a head-to-head table");
        };
        assert_eq!(current_gameweek, 4);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].record.participant_id, "a");
        assert_eq!(rows[0].record.league_points, 4);
        assert_eq!(rows[0].display_name, "A");
        assert_eq!(rows[1].record.league_points, 1);
        assert_eq!(rows[1].record.played, 2);

        // the current gameweek is excluded even once finalized
        let table = league_table(&store, &season, "h", Some(2)).await.unwrap();
        let LeagueTable::HeadToHead { rows, .. } = table else {
            panic!("expected a head-to-head table");
        };
        assert_eq!(rows[0].record.played, 1);
    }

    #[tokio::test]
    async fn classic_table_ranks_totals() {
        let store = MemoryStore::new();
        store.insert_user(User::new("a", "A")).await;
        store.insert_user(User::new("b", "B")).await;
        store
            .insert_league(league("c", LeagueType::Classic, &["a", "b"]))
            .await;
        finalize_round(&store, 1, &[("a", 2), ("b", 6)]).await;

        let table = league_table(&store, &SeasonConfig::default(), "c", None)
            .await
            .unwrap();
        let LeagueTable::Classic { rows, .. } = table else {
            panic!("expected a classic table");
        };
        assert_eq!(rows[0].user_id, "b");
        assert_eq!(rows[0].total_score, 6);
    }
}
