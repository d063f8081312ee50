use serde::Serialize;

use crate::models::match_record::ScoreLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

pub fn classify(home: u32, away: u32) -> Outcome {
    if home > away {
        Outcome::Home
    } else if home < away {
        Outcome::Away
    } else {
        Outcome::Draw
    }
}

impl From<ScoreLine> for Outcome {
    fn from(score: ScoreLine) -> Self {
        classify(score.home, score.away)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_comparison_picks_exactly_one_outcome() {
        for home in 0..6 {
            for away in 0..6 {
                let outcome = classify(home, away);
                let expected = match home.cmp(&away) {
                    std::cmp::Ordering::Greater => Outcome::Home,
                    std::cmp::Ordering::Less => Outcome::Away,
                    std::cmp::Ordering::Equal => Outcome::Draw,
                };
                assert_eq!(outcome, expected, "{}-{}", home, away);
            }
        }
    }

    #[test]
    fn scoreline_conversion() {
        assert_eq!(Outcome::from(ScoreLine::new(0, 0)), Outcome::Draw);
        assert_eq!(Outcome::from(ScoreLine::new(1, 4)), Outcome::Away);
    }
}
