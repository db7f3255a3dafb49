use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: String,
    pub name: String,
    pub score: u32,
    /// Difficulty label at submission time, e.g. "Expert".
    pub difficulty: String,
    pub date: DateTime<Utc>,
}

impl LeaderboardEntry {
    pub fn new(name: &str, score: u32, difficulty: &str, date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            score,
            difficulty: difficulty.to_string(),
            date,
        }
    }
}

/// Highest score first; equal scores keep submission order.
pub fn rank_entries(entries: &[LeaderboardEntry]) -> Vec<LeaderboardEntry> {
    let mut ranked = entries.to_vec();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}
