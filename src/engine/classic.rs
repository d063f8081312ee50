use std::collections::HashMap;

use serde::Serialize;

use crate::models::user::User;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassicRow {
    pub user_id: String,
    pub display_name: String,
    pub total_score: i64,
}

/// Members ranked by season total. Ids with no user record are dropped.
pub fn classic_standings(members: &[String], users: &HashMap<String, User>) -> Vec<ClassicRow> {
    let mut rows: Vec<ClassicRow> = members
        .iter()
        .filter_map(|id| users.get(id))
        .map(|u| ClassicRow {
            user_id: u.id.clone(),
            display_name: u.display_name.clone(),
            total_score: u.total_score,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.total_score
            .cmp(&a.total_score)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    rows
}
