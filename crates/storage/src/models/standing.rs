use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One participant's row in a league table for one gameweek.
///
/// `league_points` and `total_points` are cumulative up to and including `gameweek`;
/// `gameweek_points` is the fantasy score for that gameweek alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StandingRecord {
    pub league_key: String,
    pub gameweek: i32,
    pub participant_id: i64,
    pub participant_name: String,
    pub rank: i32,
    pub league_points: i32,
    pub gameweek_points: i32,
    pub total_points: i32,
    pub opponent: Option<String>,
    pub result: Option<String>,
}

impl StandingRecord {
    /// A row written from a full H2H round carries both its opponent and its result.
    pub fn has_match_details(&self) -> bool {
        self.opponent.as_deref().is_some_and(|o| !o.is_empty())
            && self.result.as_deref().is_some_and(|r| !r.is_empty())
    }
}
