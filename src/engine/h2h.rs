use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::models::league::FixtureTable;

pub const WIN_POINTS: u32 = 3;
pub const DRAW_POINTS: u32 = 1;

/// Persisted (frozen) points per user for one gameweek.
pub type RoundPoints = HashMap<String, i64>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct H2hRecord {
    pub participant_id: String,
    pub is_bye: bool,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub points_for: i64,
    pub league_points: u32,
}

impl H2hRecord {
    fn new(participant_id: &str, is_bye: bool) -> Self {
        H2hRecord {
            participant_id: participant_id.to_string(),
            is_bye,
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            points_for: 0,
            league_points: 0,
        }
    }

    fn record(&mut self, scored: i64, conceded: i64) {
        self.played += 1;
        self.points_for += scored;
        if scored > conceded {
            self.won += 1;
            self.league_points += WIN_POINTS;
        } else if scored == conceded {
            self.drawn += 1;
            self.league_points += DRAW_POINTS;
        } else {
            self.lost += 1;
        }
    }
}

/// Ghost opponent score: members' persisted points averaged and rounded half up.
/// Members without a persisted value that week are left out of the average.
pub fn bye_score(members: &[String], round: &RoundPoints) -> i64 {
    let scores: Vec<i64> = members.iter().filter_map(|m| round.get(m).copied()).collect();
    if scores.is_empty() {
        return 0;
    }
    let total: i64 = scores.iter().sum();
    (total as f64 / scores.len() as f64).round() as i64
}

/// Replay every finalized gameweek before `current_gameweek` against the
/// fixture table. Unfinalized rounds contribute nothing.
pub fn h2h_standings(
    members: &[String],
    fixtures: &FixtureTable,
    finalized: &HashSet<u32>,
    persisted: &BTreeMap<u32, RoundPoints>,
    current_gameweek: u32,
    bye_id: &str,
) -> Vec<H2hRecord> {
    let mut records: HashMap<String, H2hRecord> = members
        .iter()
        .map(|m| (m.clone(), H2hRecord::new(m, false)))
        .collect();
    records.insert(bye_id.to_string(), H2hRecord::new(bye_id, true));

    let empty = RoundPoints::new();
    for gameweek in 1..current_gameweek {
        if !finalized.contains(&gameweek) {
            tracing::debug!("H2H: gameweek {} not finalized, skipping", gameweek);
            continue;
        }

        let round = persisted.get(&gameweek).unwrap_or(&empty);
        let ghost = bye_score(members, round);
        let score_of = |participant: &str| -> i64 {
            if participant == bye_id {
                ghost
            } else {
                round.get(participant).copied().unwrap_or(0)
            }
        };

        for fixture in fixtures.round(gameweek) {
            let score1 = score_of(&fixture.player1);
            let score2 = score_of(&fixture.player2);
            if let Some(record) = records.get_mut(&fixture.player1) {
                record.record(score1, score2);
            }
            if let Some(record) = records.get_mut(&fixture.player2) {
                record.record(score2, score1);
            }
        }
    }

    let mut table: Vec<H2hRecord> = records
        .into_values()
        .filter(|r| !r.is_bye || r.played > 0)
        .collect();
    table.sort_by(|a, b| {
        b.league_points
            .cmp(&a.league_points)
            .then_with(|| b.points_for.cmp(&a.points_for))
            .then_with(|| a.participant_id.cmp(&b.participant_id))
    });
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::league::Fixture;

    fn members(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn round(points: &[(&str, i64)]) -> RoundPoints {
        points.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn find<'a>(table: &'a [H2hRecord], id: &str) -> &'a H2hRecord {
        table.iter().find(|r| r.participant_id == id).unwrap()
    }

    #[test]
    fn win_and_loss() {
        let mut fixtures = FixtureTable::default();
        fixtures.set_round(1, vec![Fixture::new("a", "b")]);
        let persisted = BTreeMap::from([(1, round(&[("a", 5), ("b", 3)]))]);

        let table = h2h_standings(
            &members(&["a", "b"]),
            &fixtures,
            &HashSet::from([1]),
            &persisted,
            2,
            "AVERAGE",
        );

        assert_eq!(table.len(), 2);
        let a = find(&table, "a");
        assert_eq!((a.played, a.won, a.league_points, a.points_for), (1, 1, 3, 5));
        let b = find(&table, "b");
        assert_eq!((b.played, b.lost, b.league_points, b.points_for), (1, 1, 0, 3));
        assert_eq!(table[0].participant_id, "a");
    }

    #[test]
    fn level_scores_are_a_draw() {
        let mut fixtures = FixtureTable::default();
        fixtures.set_round(1, vec![Fixture::new("a", "b")]);
        let persisted = BTreeMap::from([(1, round(&[("a", 4), ("b", 4)]))]);

        let table = h2h_standings(
            &members(&["a", "b"]),
            &fixtures,
            &HashSet::from([1]),
            &persisted,
            2,
            "AVERAGE",
        );
        for id in ["a", "b"] {
            let r = find(&table, id);
            assert_eq!((r.drawn, r.league_points, r.points_for), (1, 1, 4));
        }
    }

    #[test]
    fn skips_unfinalized_and_current_rounds() {
        let mut fixtures = FixtureTable::default();
        for gw in 1..=3 {
            fixtures.set_round(gw, vec![Fixture::new("a", "b")]);
        }
        let persisted = BTreeMap::from([
            (1, round(&[("a", 5), ("b", 3)])),
            (2, round(&[("a", 0), ("b", 9)])),
            (3, round(&[("a", 0), ("b", 9)])),
        ]);

        let table = h2h_standings(
            &members(&["a", "b"]),
            &fixtures,
            &HashSet::from([1, 3]),
            &persisted,
            3,
            "AVERAGE",
        );
        let a = find(&table, "a");
        assert_eq!(a.played, 1);
        assert_eq!(a.won, 1);
    }

    #[test]
    fn bye_plays_the_rounded_average() {
        let mut fixtures = FixtureTable::default();
        fixtures.set_round(
            1,
            vec![Fixture::new("a", "AVERAGE"), Fixture::new("b", "c")],
        );
        // average of 4, 5, 6 is 5
        let persisted = BTreeMap::from([(1, round(&[("a", 4), ("b", 5), ("c", 6)]))]);

        let table = h2h_standings(
            &members(&["a", "b", "c"]),
            &fixtures,
            &HashSet::from([1]),
            &persisted,
            2,
            "AVERAGE",
        );

        let ghost = find(&table, "AVERAGE");
        assert!(ghost.is_bye);
        assert_eq!((ghost.won, ghost.points_for), (1, 5));
        assert_eq!(find(&table, "a").lost, 1);
        assert_eq!(find(&table, "c").won, 1);
    }

    #[test]
    fn bye_hidden_until_it_plays_and_missing_points_count_as_zero() {
        let mut fixtures = FixtureTable::default();
        fixtures.set_round(1, vec![Fixture::new("a", "b")]);
        let persisted = BTreeMap::from([(1, round(&[("a", 2)]))]);

        let table = h2h_standings(
            &members(&["a", "b"]),
            &fixtures,
            &HashSet::from([1]),
            &persisted,
            5,
            "AVERAGE",
        );
        assert!(table.iter().all(|r| !r.is_bye));
        assert_eq!(find(&table, "b").points_for, 0);
        assert_eq!(find(&table, "b").lost, 1);
    }

    #[test]
    fn rounding_is_half_up() {
        let all = members(&["a", "b"]);
        assert_eq!(bye_score(&all, &round(&[("a", 2), ("b", 3)])), 3);
        assert_eq!(bye_score(&all, &round(&[("a", 1), ("b", 1)])), 1);
        assert_eq!(bye_score(&all, &round(&[("a", 4)])), 4);
        assert_eq!(bye_score(&all, &RoundPoints::new()), 0);
        // non-members are not averaged in
        assert_eq!(bye_score(&all, &round(&[("a", 2), ("x", 100)])), 2);
    }

    #[test]
    fn ties_broken_by_points_for_then_id() {
        let mut fixtures = FixtureTable::default();
        fixtures.set_round(
            1,
            vec![Fixture::new("a", "b"), Fixture::new("c", "d")],
        );
        let persisted = BTreeMap::from([(
            1,
            round(&[("a", 6), ("b", 1), ("c", 6), ("d", 2)]),
        )]);

        let table = h2h_standings(
            &members(&["d", "c", "b", "a"]),
            &fixtures,
            &HashSet::from([1]),
            &persisted,
            2,
            "AVERAGE",
        );
        let order: Vec<&str> = table.iter().map(|r| r.participant_id.as_str()).collect();
        assert_eq!(order, vec!["a", "c", "d", "b"]);
    }
}
