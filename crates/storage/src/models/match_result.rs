use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Head-to-head result for one pairing in one gameweek.
///
/// Pairs are stored with `participant_1_id < participant_2_id` so the natural key is stable
/// regardless of the order the provider listed them in. `winner` is 0 for a draw, otherwise
/// 1 or 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MatchRecord {
    pub league_key: String,
    pub gameweek: i32,
    pub participant_1_id: i64,
    pub participant_1_name: String,
    pub participant_1_points: i32,
    pub participant_2_id: i64,
    pub participant_2_name: String,
    pub participant_2_points: i32,
    pub winner: i16,
}
