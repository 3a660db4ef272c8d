//! Persistence seam for league state.

mod memory;
mod postgres;

pub use memory::MemoryStore;

use async_trait::async_trait;
use storage::error::Result;
use storage::models::{EliminationRecord, MatchRecord, QualifiedManager, StandingRecord};

use crate::snapshot::Gameweek;

#[async_trait]
pub trait LeagueStore: Send + Sync {
    async fn standings(&self, league_key: &str, gameweek: Gameweek) -> Result<Vec<StandingRecord>>;

    async fn participant_history(
        &self,
        league_key: &str,
        participant_id: i64,
        from_gameweek: Gameweek,
        to_gameweek: Gameweek,
    ) -> Result<Vec<StandingRecord>>;

    async fn matches(&self, league_key: &str, gameweek: Gameweek) -> Result<Vec<MatchRecord>>;

    /// Upserts a gameweek's standings and matches atomically.
    async fn commit_period(
        &self,
        league_key: &str,
        gameweek: Gameweek,
        standings: &[StandingRecord],
        matches: &[MatchRecord],
    ) -> Result<()>;

    async fn qualified(&self, league_key: &str) -> Result<Vec<QualifiedManager>>;

    /// Returns `false` if a registry already exists.
    async fn seed_qualified(&self, league_key: &str, managers: &[QualifiedManager])
    -> Result<bool>;

    async fn elimination_exists(&self, league_key: &str, gameweek: Gameweek) -> Result<bool>;

    async fn eliminations(
        &self,
        league_key: &str,
        gameweek: Gameweek,
    ) -> Result<Vec<EliminationRecord>>;

    /// Returns `false` if the gameweek was already finalized.
    async fn finalize_elimination(
        &self,
        league_key: &str,
        gameweek: Gameweek,
        eliminated: &[EliminationRecord],
    ) -> Result<bool>;
}
