use chrono::{DateTime, Utc};
use serde::Serialize;
use storage::models::{MatchRecord, StandingRecord};
use tracing::{info, warn};

use crate::config::H2hLeagueConfig;
use crate::context::LeagueHandle;
use crate::error::{EngineError, Result};
use crate::gameweek::GameweekData;
use crate::h2h;
use crate::reconcile::{GapReconciler, ReconcileOutcome};
use crate::snapshot::Gameweek;
use crate::source::{self, StatsSource};
use crate::store::LeagueStore;

/// Current H2H table as served to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct H2hTable {
    pub league_key: String,
    pub gameweek: Gameweek,
    pub is_live: bool,
    /// Served from cache because the provider could not be reached.
    pub stale: bool,
    /// The gameweek's rows were written to the store.
    pub persisted: bool,
    pub standings: Vec<StandingRecord>,
    pub matches: Vec<MatchRecord>,
    pub generated_at: DateTime<Utc>,
}

pub struct H2hLeague<'a, S: ?Sized, St: ?Sized> {
    config: &'a H2hLeagueConfig,
    source: &'a S,
    store: &'a St,
    concurrency: usize,
}

impl<'a, S, St> H2hLeague<'a, S, St>
where
    S: StatsSource + ?Sized,
    St: LeagueStore + ?Sized,
{
    pub fn new(
        config: &'a H2hLeagueConfig,
        source: &'a S,
        store: &'a St,
        concurrency: usize,
    ) -> Self {
        Self {
            config,
            source,
            store,
            concurrency,
        }
    }

    /// Live table for the current gameweek, reconciling stored history first.
    ///
    /// Falls back to the handle's last table when the provider is unreachable.
    pub async fn table(&self, handle: &LeagueHandle<H2hTable>) -> Result<H2hTable> {
        match self.compute(handle).await {
            Ok(table) => {
                handle.remember(table.clone()).await;
                Ok(table)
            }
            Err(EngineError::Source(e)) => {
                warn!(league = %self.config.key, error = %e, "Provider unavailable for H2H table");
                match handle.cached().await {
                    Some(mut cached) => {
                        cached.stale = true;
                        Ok(cached)
                    }
                    None => Err(EngineError::DataUnavailable(self.config.key.clone())),
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn compute(&self, handle: &LeagueHandle<H2hTable>) -> Result<H2hTable> {
        let events = self.source.events().await?;
        let current = source::current_gameweek(&events)
            .ok_or_else(|| EngineError::DataUnavailable(self.config.key.clone()))?;

        let teams = h2h::resolve_teams(self.config, self.source).await?;
        let reconciler =
            GapReconciler::new(self.config, &teams, self.source, self.store, self.concurrency);
        let outcome = reconciler.run(handle, current, &events).await?;
        info!(league = %self.config.key, current, outcome = ?outcome, "Reconciliation checked");

        let base = reconciler.base_totals(current - 1).await?;
        let data = GameweekData::load(self.source, current).await?;
        let period =
            h2h::compute_period(self.config, &teams, self.source, &data, &base, self.concurrency)
                .await?;

        // Rows built on a base with holes under it would hide those holes from later runs.
        let history_settled = match &outcome {
            ReconcileOutcome::AlreadyRunning => false,
            ReconcileOutcome::UpToDate => true,
            ReconcileOutcome::Rebuilt { stopped_at, .. } => stopped_at.is_none(),
        } && reconciler.detect_gaps(current, &events).await?.is_empty();

        let finished = data.snapshot.all_finished();
        let persisted = finished && history_settled;
        if finished && !history_settled {
            warn!(
                league = %self.config.key,
                current,
                "History incomplete, serving finished gameweek without persisting"
            );
        }
        if persisted {
            self.store
                .commit_period(&self.config.key, current, &period.standings, &period.matches)
                .await?;
        }

        Ok(H2hTable {
            league_key: self.config.key.clone(),
            gameweek: current,
            is_live: data.snapshot.is_live(),
            stale: false,
            persisted,
            standings: period.standings,
            matches: period.matches,
            generated_at: Utc::now(),
        })
    }
}
