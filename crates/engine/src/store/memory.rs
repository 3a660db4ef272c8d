use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use storage::error::{Result, StorageError};
use storage::models::{EliminationRecord, MatchRecord, QualifiedManager, StandingRecord};

use super::LeagueStore;
use crate::snapshot::Gameweek;

#[derive(Debug, Default)]
struct Tables {
    standings: BTreeMap<(String, Gameweek, i64), StandingRecord>,
    matches: BTreeMap<(String, Gameweek, i64, i64), MatchRecord>,
    qualified: BTreeMap<(String, i64), QualifiedManager>,
    eliminations: BTreeMap<(String, Gameweek, i64), EliminationRecord>,
    commits: usize,
}

/// Process-local store with the same keys and write rules as the database tables.
///
/// Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of period commits applied so far.
    pub fn commit_count(&self) -> usize {
        self.lock().commits
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl LeagueStore for MemoryStore {
    async fn standings(&self, league_key: &str, gameweek: Gameweek) -> Result<Vec<StandingRecord>> {
        let tables = self.lock();
        let mut rows: Vec<StandingRecord> = tables
            .standings
            .values()
            .filter(|r| r.league_key == league_key && r.gameweek == gameweek)
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.rank, r.participant_id));
        Ok(rows)
    }

    async fn participant_history(
        &self,
        league_key: &str,
        participant_id: i64,
        from_gameweek: Gameweek,
        to_gameweek: Gameweek,
    ) -> Result<Vec<StandingRecord>> {
        let tables = self.lock();
        Ok(tables
            .standings
            .values()
            .filter(|r| {
                r.league_key == league_key
                    && r.participant_id == participant_id
                    && (from_gameweek..=to_gameweek).contains(&r.gameweek)
            })
            .cloned()
            .collect())
    }

    async fn matches(&self, league_key: &str, gameweek: Gameweek) -> Result<Vec<MatchRecord>> {
        let tables = self.lock();
        Ok(tables
            .matches
            .values()
            .filter(|m| m.league_key == league_key && m.gameweek == gameweek)
            .cloned()
            .collect())
    }

    async fn commit_period(
        &self,
        _league_key: &str,
        _gameweek: Gameweek,
        standings: &[StandingRecord],
        matches: &[MatchRecord],
    ) -> Result<()> {
        let mut tables = self.lock();
        for row in standings {
            tables.standings.insert(
                (row.league_key.clone(), row.gameweek, row.participant_id),
                row.clone(),
            );
        }
        for row in matches {
            tables.matches.insert(
                (
                    row.league_key.clone(),
                    row.gameweek,
                    row.participant_1_id,
                    row.participant_2_id,
                ),
                row.clone(),
            );
        }
        tables.commits += 1;
        Ok(())
    }

    async fn qualified(&self, league_key: &str) -> Result<Vec<QualifiedManager>> {
        let tables = self.lock();
        let mut rows: Vec<QualifiedManager> = tables
            .qualified
            .values()
            .filter(|q| q.league_key == league_key)
            .cloned()
            .collect();
        rows.sort_by_key(|q| (q.qualification_rank, q.entry_id));
        Ok(rows)
    }

    async fn seed_qualified(
        &self,
        league_key: &str,
        managers: &[QualifiedManager],
    ) -> Result<bool> {
        let mut tables = self.lock();
        if tables.qualified.keys().any(|(league, _)| league == league_key) {
            return Ok(false);
        }
        for manager in managers {
            tables
                .qualified
                .entry((manager.league_key.clone(), manager.entry_id))
                .or_insert_with(|| manager.clone());
        }
        Ok(true)
    }

    async fn elimination_exists(&self, league_key: &str, gameweek: Gameweek) -> Result<bool> {
        let tables = self.lock();
        Ok(tables
            .eliminations
            .keys()
            .any(|(league, gw, _)| league == league_key && *gw == gameweek))
    }

    async fn eliminations(
        &self,
        league_key: &str,
        gameweek: Gameweek,
    ) -> Result<Vec<EliminationRecord>> {
        let tables = self.lock();
        let mut rows: Vec<EliminationRecord> = tables
            .eliminations
            .values()
            .filter(|e| e.league_key == league_key && e.gameweek == gameweek)
            .cloned()
            .collect();
        rows.sort_by_key(|e| e.gameweek_rank);
        Ok(rows)
    }

    async fn finalize_elimination(
        &self,
        league_key: &str,
        gameweek: Gameweek,
        eliminated: &[EliminationRecord],
    ) -> Result<bool> {
        let mut tables = self.lock();
        if tables
            .eliminations
            .keys()
            .any(|(league, gw, _)| league == league_key && *gw == gameweek)
        {
            return Ok(false);
        }

        let key = league_key.to_string();
        if let Some(record) = eliminated.iter().find(|r| {
            tables
                .qualified
                .get(&(key.clone(), r.entry_id))
                .is_none_or(|m| m.eliminated_gw.is_some())
        }) {
            return Err(StorageError::NotActiveQualifier {
                league_key: key,
                entry_id: record.entry_id,
            });
        }

        for record in eliminated {
            tables
                .eliminations
                .insert((key.clone(), gameweek, record.entry_id), record.clone());
            if let Some(manager) = tables.qualified.get_mut(&(key.clone(), record.entry_id)) {
                manager.eliminated_gw = Some(gameweek);
                manager.final_rank = Some(record.gameweek_rank);
            }
        }
        Ok(true)
    }
}
