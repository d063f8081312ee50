use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeagueType {
    Classic,
    #[serde(alias = "h2h")]
    HeadToHead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeagueStatus {
    #[default]
    Recruiting,
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fixture {
    pub player1: String,
    pub player2: String,
}

impl Fixture {
    pub fn new(player1: impl Into<String>, player2: impl Into<String>) -> Self {
        Fixture {
            player1: player1.into(),
            player2: player2.into(),
        }
    }

    #[cfg(test)]
    pub fn involves(&self, participant: &str) -> bool {
        self.player1 == participant || self.player2 == participant
    }
}

/// Gameweek number → that round's pairings. Keys are stored as strings so the
/// table survives a round-trip through the document store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixtureTable(BTreeMap<String, Vec<Fixture>>);

impl FixtureTable {
    pub fn round(&self, gameweek: u32) -> &[Fixture] {
        self.0
            .get(&gameweek.to_string())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn set_round(&mut self, gameweek: u32, fixtures: Vec<Fixture>) {
        self.0.insert(gameweek.to_string(), fixtures);
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Stored document for a private league
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub league_type: LeagueType,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub status: LeagueStatus,
    #[serde(default)]
    pub fixtures: FixtureTable,
}
