use serde::Serialize;

use crate::engine::aggregator::GameweekStanding;
use crate::models::gameweek::Gameweek;
use crate::models::match_record::Match;

/// Whether a gameweek may be finalized right now, and if not, why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    AlreadyFinalized,
    NoMatches,
    MatchesPending { remaining: usize },
    NoPredictions,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }

    pub fn message(&self) -> String {
        match self {
            Readiness::Ready => "All matches finished, ready to finalize".to_string(),
            Readiness::AlreadyFinalized => "Gameweek already finalized".to_string(),
            Readiness::NoMatches => "Waiting for match data".to_string(),
            Readiness::MatchesPending { remaining } => {
                format!("{} match(es) still to finish", remaining)
            }
            Readiness::NoPredictions => "No one has made predictions yet".to_string(),
        }
    }
}

pub fn readiness(gameweek: &Gameweek, matches: &[Match], standings: &[GameweekStanding]) -> Readiness {
    if gameweek.is_finalized {
        return Readiness::AlreadyFinalized;
    }
    if matches.is_empty() {
        return Readiness::NoMatches;
    }
    let remaining = matches.iter().filter(|m| !m.status.is_finished()).count();
    if remaining > 0 {
        return Readiness::MatchesPending { remaining };
    }
    if standings.is_empty() {
        return Readiness::NoPredictions;
    }
    Readiness::Ready
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::match_record::{MatchStatus, ScoreLine};
    use chrono::Utc;

    fn game(id: &str, status: MatchStatus) -> Match {
        Match {
            id: id.into(),
            home_team: "A".into(),
            away_team: "B".into(),
            kickoff: Utc::now(),
            status,
            score: Some(ScoreLine::new(1, 1)),
        }
    }

    fn standing(user: &str) -> GameweekStanding {
        GameweekStanding {
            user_id: user.into(),
            total_points: 1,
            exact_count: 0,
            correct_count: 1,
        }
    }

    #[test]
    fn ready_only_when_everything_is_in() {
        let gw = Gameweek::new(3);
        let matches = vec![
            game("m1", MatchStatus::Finished),
            game("m2", MatchStatus::Finished),
            game("m3", MatchStatus::Finished),
        ];
        let standings = vec![standing("alice"), standing("bob")];
        assert_eq!(readiness(&gw, &matches, &standings), Readiness::Ready);
    }

    #[test]
    fn reports_what_is_missing() {
        let gw = Gameweek::new(3);
        let standings = vec![standing("alice")];

        assert_eq!(readiness(&gw, &[], &standings), Readiness::NoMatches);

        let matches = vec![
            game("m1", MatchStatus::Finished),
            game("m2", MatchStatus::Paused),
            game("m3", MatchStatus::Timed),
        ];
        assert_eq!(
            readiness(&gw, &matches, &standings),
            Readiness::MatchesPending { remaining: 2 }
        );

        let matches = vec![game("m1", MatchStatus::Finished)];
        assert_eq!(readiness(&gw, &matches, &[]), Readiness::NoPredictions);

        let mut done = Gameweek::new(3);
        done.is_finalized = true;
        assert_eq!(readiness(&done, &matches, &standings), Readiness::AlreadyFinalized);
    }
}
