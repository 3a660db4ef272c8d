use async_trait::async_trait;
use storage::Database;
use storage::error::Result;
use storage::models::{EliminationRecord, MatchRecord, QualifiedManager, StandingRecord};
use storage::repository::matches::MatchRepository;
use storage::repository::standings::StandingsRepository;
use storage::repository::tournament::TournamentRepository;
use storage::services::league_writes;

use super::LeagueStore;
use crate::snapshot::Gameweek;

#[async_trait]
impl LeagueStore for Database {
    async fn standings(&self, league_key: &str, gameweek: Gameweek) -> Result<Vec<StandingRecord>> {
        StandingsRepository::new(self.pool())
            .for_gameweek(league_key, gameweek)
            .await
    }

    async fn participant_history(
        &self,
        league_key: &str,
        participant_id: i64,
        from_gameweek: Gameweek,
        to_gameweek: Gameweek,
    ) -> Result<Vec<StandingRecord>> {
        StandingsRepository::new(self.pool())
            .participant_history(league_key, participant_id, from_gameweek, to_gameweek)
            .await
    }

    async fn matches(&self, league_key: &str, gameweek: Gameweek) -> Result<Vec<MatchRecord>> {
        MatchRepository::new(self.pool())
            .for_gameweek(league_key, gameweek)
            .await
    }

    async fn commit_period(
        &self,
        league_key: &str,
        gameweek: Gameweek,
        standings: &[StandingRecord],
        matches: &[MatchRecord],
    ) -> Result<()> {
        league_writes::commit_period(self.pool(), league_key, gameweek, standings, matches).await
    }

    async fn qualified(&self, league_key: &str) -> Result<Vec<QualifiedManager>> {
        TournamentRepository::new(self.pool())
            .list_qualified(league_key)
            .await
    }

    async fn seed_qualified(
        &self,
        league_key: &str,
        managers: &[QualifiedManager],
    ) -> Result<bool> {
        league_writes::seed_qualified(self.pool(), league_key, managers).await
    }

    async fn elimination_exists(&self, league_key: &str, gameweek: Gameweek) -> Result<bool> {
        TournamentRepository::new(self.pool())
            .elimination_exists(league_key, gameweek)
            .await
    }

    async fn eliminations(
        &self,
        league_key: &str,
        gameweek: Gameweek,
    ) -> Result<Vec<EliminationRecord>> {
        TournamentRepository::new(self.pool())
            .eliminations_for(league_key, gameweek)
            .await
    }

    async fn finalize_elimination(
        &self,
        league_key: &str,
        gameweek: Gameweek,
        eliminated: &[EliminationRecord],
    ) -> Result<bool> {
        league_writes::finalize_elimination(self.pool(), league_key, gameweek, eliminated).await
    }
}
