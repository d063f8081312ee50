use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    /// Sum of every finalized gameweek's points ever applied to this user.
    #[serde(default)]
    pub total_score: i64,
}

impl User {
    #[cfg(test)]
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        User {
            id: id.into(),
            display_name: display_name.into(),
            total_score: 0,
        }
    }
}
