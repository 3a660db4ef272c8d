use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Write-once record of a manager knocked out in a given gameweek.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct EliminationRecord {
    pub league_key: String,
    pub gameweek: i32,
    pub entry_id: i64,
    pub manager_name: String,
    pub team_name: String,
    pub gameweek_points: i32,
    pub gameweek_rank: i32,
}
