use serde::Serialize;

use crate::config::ScoringRules;
use crate::engine::outcome::Outcome;
use crate::models::match_record::ScoreLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Hit {
    Exact,
    CorrectResult,
    Miss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scored {
    pub hit: Hit,
    pub points: i64,
}

/// Score one prediction against a final result. Only call with a complete
/// actual scoreline; unfinished matches are not scoreable.
pub fn score_prediction(predicted: ScoreLine, actual: ScoreLine, rules: &ScoringRules) -> Scored {
    if predicted == actual {
        Scored {
            hit: Hit::Exact,
            points: rules.exact_score,
        }
    } else if Outcome::from(predicted) == Outcome::from(actual) {
        Scored {
            hit: Hit::CorrectResult,
            points: rules.correct_result,
        }
    } else {
        Scored {
            hit: Hit::Miss,
            points: 0,
        }
    }
}
