use std::collections::HashSet;

use crate::config::SeasonConfig;
use crate::errors::{AppError, Result};
use crate::models::league::{Fixture, FixtureTable};

/// One complete single round robin using the circle method. Position 0 stays
/// fixed; after every round the last participant moves to position 1. An odd
/// field is padded with the bye participant.
pub fn base_schedule(members: &[String], bye_id: &str) -> Result<Vec<Vec<Fixture>>> {
    if members.len() < 2 {
        return Err(AppError::invalid_data(
            "Need at least 2 members to build a schedule",
        ));
    }
    let mut seen = HashSet::new();
    for member in members {
        if member == bye_id {
            return Err(AppError::invalid_data(format!(
                "Member id '{}' is reserved for the bye participant",
                bye_id
            )));
        }
        if !seen.insert(member.as_str()) {
            return Err(AppError::invalid_data(format!("Duplicate member '{}'", member)));
        }
    }

    let mut circle: Vec<String> = members.to_vec();
    if circle.len() % 2 != 0 {
        circle.push(bye_id.to_string());
    }

    let size = circle.len();
    let mut rounds = Vec::with_capacity(size - 1);
    for _ in 0..size - 1 {
        let round = (0..size / 2)
            .map(|i| Fixture::new(circle[i].clone(), circle[size - 1 - i].clone()))
            .collect();
        rounds.push(round);

        if let Some(last) = circle.pop() {
            circle.insert(1, last);
        }
    }
    Ok(rounds)
}

/// Fixtures for the whole season, the base schedule repeating from gameweek 1.
pub fn generate_fixtures(members: &[String], season: &SeasonConfig) -> Result<FixtureTable> {
    regenerate_from(&FixtureTable::default(), members, 1, season)
}

/// Rebuild the schedule for `members` from `from_gameweek` to the end of the
/// season. Earlier rounds are copied over untouched and `from_gameweek` starts
/// the new cycle at base round 0.
pub fn regenerate_from(
    existing: &FixtureTable,
    members: &[String],
    from_gameweek: u32,
    season: &SeasonConfig,
) -> Result<FixtureTable> {
    season.check_gameweek(from_gameweek)?;
    let base = base_schedule(members, &season.bye_participant_id)?;

    let mut table = existing.clone();
    for gameweek in from_gameweek..=season.total_gameweeks {
        let index = (gameweek - from_gameweek) as usize % base.len();
        table.set_round(gameweek, base[index].clone());
    }
    Ok(table)
}
