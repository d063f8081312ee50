use std::collections::BTreeMap;

use crate::models::match_record::Match;

/// The gameweek holding the earliest match that has not kicked off yet. Once
/// every match has started or finished the season is on its last gameweek.
pub fn detect_current_gameweek(matches_by_gameweek: &BTreeMap<u32, Vec<Match>>, total_gameweeks: u32) -> u32 {
    matches_by_gameweek
        .iter()
        .flat_map(|(gameweek, matches)| matches.iter().map(move |m| (*gameweek, m)))
        .filter(|(_, m)| m.status.is_upcoming())
        .min_by_key(|(gameweek, m)| (m.kickoff, *gameweek))
        .map(|(gameweek, _)| gameweek)
        .unwrap_or(total_gameweeks)
}
