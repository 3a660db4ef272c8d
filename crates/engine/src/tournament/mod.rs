//! Qualification, elimination and championship phases of a knockout tournament league.

mod controller;
mod registry;

pub use controller::{PhaseStandings, StandingRow, TournamentController};
pub use registry::{QualifiedRegistry, rewind_current_gameweek, select_qualifiers};

use serde::{Deserialize, Serialize};

use crate::config::TournamentConfig;
use crate::snapshot::Gameweek;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Qualification,
    Elimination,
    Championship,
}

impl Phase {
    /// Gameweeks past the last configured phase stay in the championship.
    pub fn for_gameweek(gameweek: Gameweek, config: &TournamentConfig) -> Phase {
        if gameweek <= config.qualification_end {
            Phase::Qualification
        } else if gameweek <= config.elimination_end {
            Phase::Elimination
        } else {
            Phase::Championship
        }
    }
}
