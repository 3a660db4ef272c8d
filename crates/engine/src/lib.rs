pub mod autosub;
pub mod bonus;
pub mod config;
pub mod context;
pub mod error;
pub mod gameweek;
pub mod h2h;
pub mod reconcile;
pub mod scoring;
pub mod snapshot;
pub mod source;
pub mod store;
pub mod tournament;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{FetchConfig, H2hLeagueConfig, LeagueTeam, LeaguesConfig, TournamentConfig};
pub use context::{LeagueContext, LeagueHandle};
pub use error::{EngineError, Result, SourceError};
pub use scoring::{LiveScore, LiveScoringCalculator, ScoringRules};
pub use snapshot::{EntryId, Gameweek, PlayerId, StatsSnapshot};
pub use source::StatsSource;
pub use store::LeagueStore;
