//! Detects gameweeks missing from stored H2H history and rebuilds them in order.

use serde::Serialize;
use storage::error::StorageError;
use tracing::{debug, info, warn};

use crate::config::{H2hLeagueConfig, LeagueTeam};
use crate::context::LeagueHandle;
use crate::error::Result;
use crate::gameweek::GameweekData;
use crate::h2h::{self, BaseTotals, PeriodResult};
use crate::snapshot::Gameweek;
use crate::source::{self, EventStatus, StatsSource};
use crate::store::LeagueStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// Another run for the same league holds the guard.
    AlreadyRunning,
    UpToDate,
    Rebuilt {
        gameweeks: Vec<Gameweek>,
        /// First gameweek that could not be rebuilt; later gaps were left alone.
        stopped_at: Option<Gameweek>,
    },
}

pub struct GapReconciler<'a, S: ?Sized, St: ?Sized> {
    config: &'a H2hLeagueConfig,
    teams: &'a [LeagueTeam],
    source: &'a S,
    store: &'a St,
    concurrency: usize,
}

impl<'a, S, St> GapReconciler<'a, S, St>
where
    S: StatsSource + ?Sized,
    St: LeagueStore + ?Sized,
{
    pub fn new(
        config: &'a H2hLeagueConfig,
        teams: &'a [LeagueTeam],
        source: &'a S,
        store: &'a St,
        concurrency: usize,
    ) -> Self {
        Self {
            config,
            teams,
            source,
            store,
            concurrency,
        }
    }

    /// Rebuild every missing gameweek before `current`, unless a run is already in flight.
    pub async fn run<T: Clone>(
        &self,
        handle: &LeagueHandle<T>,
        current: Gameweek,
        events: &[EventStatus],
    ) -> Result<ReconcileOutcome> {
        let Some(_guard) = handle.try_exclusive() else {
            info!(league = %self.config.key, "Reconciliation already running");
            return Ok(ReconcileOutcome::AlreadyRunning);
        };

        let gaps = self.detect_gaps(current, events).await?;
        if gaps.is_empty() {
            debug!(league = %self.config.key, current, "No gaps to reconcile");
            return Ok(ReconcileOutcome::UpToDate);
        }

        info!(league = %self.config.key, gaps = ?gaps, "Reconciling missing gameweeks");

        let mut base = self.base_totals(gaps[0] - 1).await?;
        let mut rebuilt = Vec::new();
        let mut stopped_at = None;

        for gameweek in gaps {
            let period = match self.rebuild(gameweek, &base).await {
                Ok(period) => period,
                Err(e) => {
                    warn!(league = %self.config.key, gameweek, error = %e, "Rebuild failed, stopping");
                    stopped_at = Some(gameweek);
                    break;
                }
            };

            if let Err(e) = self
                .store
                .commit_period(&self.config.key, gameweek, &period.standings, &period.matches)
                .await
            {
                warn!(league = %self.config.key, gameweek, error = %e, "Commit failed, stopping");
                stopped_at = Some(gameweek);
                break;
            }

            base = BaseTotals::from_standings(&period.standings);
            rebuilt.push(gameweek);
        }

        info!(
            league = %self.config.key,
            rebuilt = rebuilt.len(),
            stopped_at = ?stopped_at,
            "Reconciliation finished"
        );

        Ok(ReconcileOutcome::Rebuilt {
            gameweeks: rebuilt,
            stopped_at,
        })
    }

    /// Walk back from the gameweek before `current` to the last complete one, collecting
    /// finished gameweeks whose stored rows are absent or incomplete. Oldest first.
    pub async fn detect_gaps(
        &self,
        current: Gameweek,
        events: &[EventStatus],
    ) -> std::result::Result<Vec<Gameweek>, StorageError> {
        let mut gaps = Vec::new();
        if self.teams.is_empty() {
            return Ok(gaps);
        }

        let floor = self.config.baseline_gameweek + 1;
        let mut gameweek = current - 1;
        while gameweek >= floor {
            let rows = self.store.standings(&self.config.key, gameweek).await?;
            if h2h::is_complete(&rows, self.teams.len()) {
                break;
            }
            if source::is_finished(events, gameweek) {
                gaps.push(gameweek);
            }
            gameweek -= 1;
        }

        gaps.reverse();
        Ok(gaps)
    }

    /// Cumulative totals as of `gameweek`, walking further back past incomplete rows.
    pub async fn base_totals(
        &self,
        gameweek: Gameweek,
    ) -> std::result::Result<BaseTotals, StorageError> {
        let mut candidate = gameweek;
        while candidate > self.config.baseline_gameweek {
            let rows = self.store.standings(&self.config.key, candidate).await?;
            if h2h::is_complete(&rows, self.teams.len()) {
                return Ok(BaseTotals::from_standings(&rows));
            }
            candidate -= 1;
        }
        Ok(BaseTotals::default())
    }

    async fn rebuild(&self, gameweek: Gameweek, base: &BaseTotals) -> Result<PeriodResult> {
        let data = GameweekData::load(self.source, gameweek).await?;
        let period = h2h::compute_period(
            self.config,
            self.teams,
            self.source,
            &data,
            base,
            self.concurrency,
        )
        .await?;
        Ok(period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::test_support::{FakeSource, h2h_config};

    const LEAGUE: &str = "office";

    async fn reconcile(
        source: &FakeSource,
        store: &MemoryStore,
        handle: &LeagueHandle<()>,
        current: Gameweek,
    ) -> ReconcileOutcome {
        let config = h2h_config(LEAGUE, 0);
        let events = source.events_list();
        let reconciler = GapReconciler::new(&config, &config.teams, source, store, 4);
        reconciler.run(handle, current, &events).await.unwrap()
    }

    #[tokio::test]
    async fn test_rebuilds_every_missing_gameweek_in_order() {
        let source = FakeSource::h2h_season(4);
        let store = MemoryStore::new();
        let handle: LeagueHandle<()> = LeagueHandle::new(LEAGUE);

        let outcome = reconcile(&source, &store, &handle, 4).await;

        assert_eq!(
            outcome,
            ReconcileOutcome::Rebuilt {
                gameweeks: vec![1, 2, 3],
                stopped_at: None
            }
        );
        let gw3 = store.standings(LEAGUE, 3).await.unwrap();
        assert_eq!(gw3.len(), 4);
        assert!(h2h::is_complete(&gw3, 4));
        // Team 1 wins every week.
        let leader = &gw3[0];
        assert_eq!(leader.participant_id, 1);
        assert_eq!(leader.league_points, 9);
    }

    #[tokio::test]
    async fn test_second_run_is_a_no_op() {
        let source = FakeSource::h2h_season(4);
        let store = MemoryStore::new();
        let handle: LeagueHandle<()> = LeagueHandle::new(LEAGUE);

        reconcile(&source, &store, &handle, 4).await;
        let commits = store.commit_count();
        let before = store.standings(LEAGUE, 3).await.unwrap();

        let outcome = reconcile(&source, &store, &handle, 4).await;

        assert_eq!(outcome, ReconcileOutcome::UpToDate);
        assert_eq!(store.commit_count(), commits);
        assert_eq!(store.standings(LEAGUE, 3).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_only_gaps_after_last_complete_week_are_rebuilt() {
        let source = FakeSource::h2h_season(5);
        let store = MemoryStore::new();
        let handle: LeagueHandle<()> = LeagueHandle::new(LEAGUE);

        reconcile(&source, &store, &handle, 3).await;
        let outcome = reconcile(&source, &store, &handle, 5).await;

        assert_eq!(
            outcome,
            ReconcileOutcome::Rebuilt {
                gameweeks: vec![3, 4],
                stopped_at: None
            }
        );
        let gw4 = store.standings(LEAGUE, 4).await.unwrap();
        assert_eq!(gw4[0].league_points, 12);
    }

    #[tokio::test]
    async fn test_failed_gameweek_stops_the_walk() {
        let mut source = FakeSource::h2h_season(5);
        source.fail_snapshot(3);
        let store = MemoryStore::new();
        let handle: LeagueHandle<()> = LeagueHandle::new(LEAGUE);

        let outcome = reconcile(&source, &store, &handle, 5).await;

        assert_eq!(
            outcome,
            ReconcileOutcome::Rebuilt {
                gameweeks: vec![1, 2],
                stopped_at: Some(3)
            }
        );
        assert!(store.standings(LEAGUE, 3).await.unwrap().is_empty());
        assert!(store.standings(LEAGUE, 4).await.unwrap().is_empty());
        assert_eq!(store.standings(LEAGUE, 2).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_busy_guard_makes_trigger_a_no_op() {
        let source = FakeSource::h2h_season(4);
        let store = MemoryStore::new();
        let handle: LeagueHandle<()> = LeagueHandle::new(LEAGUE);

        let _held = handle.try_exclusive();
        let outcome = reconcile(&source, &store, &handle, 4).await;

        assert_eq!(outcome, ReconcileOutcome::AlreadyRunning);
        assert_eq!(store.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_picks_count_as_zero() {
        let mut source = FakeSource::h2h_season(2);
        source.remove_roster(11, 1);
        let store = MemoryStore::new();
        let handle: LeagueHandle<()> = LeagueHandle::new(LEAGUE);

        reconcile(&source, &store, &handle, 2).await;

        let gw1 = store.standings(LEAGUE, 1).await.unwrap();
        let team1 = gw1.iter().find(|r| r.participant_id == 1).unwrap();
        assert_eq!(team1.gameweek_points, 0);
        assert_eq!(team1.result.as_deref(), Some("L"));
    }

    #[tokio::test]
    async fn test_unavailable_roster_aborts_gameweek() {
        let mut source = FakeSource::h2h_season(3);
        source.fail_roster(22, 2);
        let store = MemoryStore::new();
        let handle: LeagueHandle<()> = LeagueHandle::new(LEAGUE);

        let outcome = reconcile(&source, &store, &handle, 3).await;

        assert_eq!(
            outcome,
            ReconcileOutcome::Rebuilt {
                gameweeks: vec![1],
                stopped_at: Some(2)
            }
        );
    }
}
