use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct QualifiedManager {
    pub league_key: String,
    pub entry_id: i64,
    pub manager_name: String,
    pub team_name: String,
    pub qualification_rank: i32,
    pub qualification_total: i32,
    pub is_defending_champion: bool,
    pub eliminated_gw: Option<i32>,
    pub final_rank: Option<i32>,
}
