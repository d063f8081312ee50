use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// Stored document, one per gameweek
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Gameweek {
    #[serde(rename = "_id")]
    pub id: String,
    pub number: u32,
    #[serde(default)]
    pub is_finalized: bool,
    /// Exact per-user deltas added to `total_score` by the last finalization.
    #[serde(default)]
    pub applied_points: BTreeMap<String, i64>,
}

impl Gameweek {
    pub fn new(number: u32) -> Self {
        Gameweek {
            id: Self::doc_id(number),
            number,
            is_finalized: false,
            applied_points: BTreeMap::new(),
        }
    }

    pub fn doc_id(number: u32) -> String {
        format!("gameweek_{}", number)
    }
}
