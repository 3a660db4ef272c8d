use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use storage::models::{EliminationRecord, QualifiedManager};
use tracing::{debug, info, warn};

use super::Phase;
use super::registry::{QualifiedRegistry, rewind_current_gameweek, select_qualifiers};
use crate::config::TournamentConfig;
use crate::context::LeagueHandle;
use crate::error::{EngineError, Result};
use crate::gameweek::{self, EntryOutcome, GameweekData};
use crate::scoring::LiveScoringCalculator;
use crate::snapshot::{EntryId, Gameweek};
use crate::source::{self, StatsSource};
use crate::store::LeagueStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandingRow {
    pub entry: EntryId,
    pub manager_name: String,
    pub team_name: String,
    pub rank: i32,
    /// `None` when the entry's picks could not be fetched.
    pub gameweek_points: Option<i32>,
    pub total_points: Option<i32>,
    pub rank_change: Option<i32>,
    pub captain: Option<String>,
    pub chip: String,
    pub qualification_rank: Option<i32>,
    pub in_elimination_zone: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseStandings {
    pub league_key: String,
    pub phase: Phase,
    pub gameweek: Gameweek,
    pub is_live: bool,
    pub stale: bool,
    /// Nothing for the gameweek will change: its eliminations are written, or it is the
    /// finished last gameweek of the championship.
    pub finalized: bool,
    pub managers_remaining: usize,
    pub rows: Vec<StandingRow>,
    pub generated_at: DateTime<Utc>,
}

pub struct TournamentController<'a, S: ?Sized, St: ?Sized> {
    config: &'a TournamentConfig,
    source: &'a S,
    store: &'a St,
    calculator: LiveScoringCalculator,
    concurrency: usize,
}

impl<'a, S, St> TournamentController<'a, S, St>
where
    S: StatsSource + ?Sized,
    St: LeagueStore + ?Sized,
{
    pub fn new(
        config: &'a TournamentConfig,
        source: &'a S,
        store: &'a St,
        concurrency: usize,
    ) -> Self {
        Self {
            config,
            source,
            store,
            calculator: LiveScoringCalculator::new(config.rules),
            concurrency,
        }
    }

    /// Standings for the provider's current gameweek.
    ///
    /// Falls back to the handle's last result when the provider is unreachable.
    pub async fn standings(
        &self,
        handle: &LeagueHandle<PhaseStandings>,
    ) -> Result<PhaseStandings> {
        let computed = match self.source.events().await {
            Ok(events) => match source::current_gameweek(&events) {
                Some(gameweek) => self.standings_for(gameweek).await,
                None => Err(EngineError::DataUnavailable(self.config.key.clone())),
            },
            Err(e) => Err(e.into()),
        };

        match computed {
            Ok(standings) => {
                handle.remember(standings.clone()).await;
                Ok(standings)
            }
            Err(EngineError::Source(e)) => {
                warn!(league = %self.config.key, error = %e, "Provider unavailable for tournament");
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

    pub async fn standings_for(&self, gameweek: Gameweek) -> Result<PhaseStandings> {
        let phase = Phase::for_gameweek(gameweek, self.config);
        debug!(league = %self.config.key, gameweek, phase = ?phase, "Computing tournament standings");

        let data = GameweekData::load(self.source, gameweek).await?;
        match phase {
            Phase::Qualification => self.qualification(&data).await,
            Phase::Elimination => self.elimination(&data).await,
            Phase::Championship => self.championship(&data).await,
        }
    }

    /// Load the qualified registry, seeding it from the classic ranking the first time.
    pub async fn ensure_registry(&self) -> Result<QualifiedRegistry> {
        let existing = self.store.qualified(&self.config.key).await?;
        if !existing.is_empty() {
            return Ok(QualifiedRegistry::new(existing));
        }

        let standings = self.source.classic_standings(self.config.league_id).await?;
        let events = self.source.events().await?;
        let standings = match source::current_gameweek(&events) {
            Some(current) if current > self.config.qualification_end => {
                if current > self.config.qualification_end + 1 {
                    warn!(
                        league = %self.config.key,
                        current,
                        "Seeding late, earlier elimination points remain in qualification totals"
                    );
                }
                rewind_current_gameweek(&standings)
            }
            _ => standings,
        };
        let selected = select_qualifiers(
            &self.config.key,
            &standings,
            self.config.qualified_count,
            self.config.defending_champion,
        );
        if selected.is_empty() {
            return Err(EngineError::DataUnavailable(self.config.key.clone()));
        }

        let seeded = self.store.seed_qualified(&self.config.key, &selected).await?;
        info!(league = %self.config.key, seeded, count = selected.len(), "Qualified registry ready");

        Ok(QualifiedRegistry::new(
            self.store.qualified(&self.config.key).await?,
        ))
    }

    async fn qualification(&self, data: &GameweekData) -> Result<PhaseStandings> {
        let standings = self.source.classic_standings(self.config.league_id).await?;
        if standings.is_empty() {
            return Err(EngineError::DataUnavailable(self.config.key.clone()));
        }

        let entries: Vec<EntryId> = standings.iter().map(|s| s.entry).collect();
        let outcomes = self.score(data, &entries).await;

        // Managers without picks are left out of the live ranking.
        let mut ranked: Vec<(i32, i32, StandingRow, i32)> = standings
            .iter()
            .filter_map(|s| {
                let EntryOutcome::Scored { roster, score } = outcomes.get(&s.entry)? else {
                    return None;
                };
                let live_total = s.total - roster.provider_points + score.points;
                let previous_rank = s.last_rank.filter(|r| *r > 0).unwrap_or(s.rank);
                let row = StandingRow {
                    entry: s.entry,
                    manager_name: s.player_name.clone(),
                    team_name: s.entry_name.clone(),
                    rank: 0,
                    gameweek_points: Some(score.points),
                    total_points: Some(live_total),
                    rank_change: None,
                    captain: captain_name(data, score.captain),
                    chip: score.chip.label().to_string(),
                    qualification_rank: None,
                    in_elimination_zone: false,
                };
                Some((live_total, score.points, row, previous_rank))
            })
            .collect();

        ranked.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));

        let rows = ranked
            .into_iter()
            .enumerate()
            .map(|(idx, (_, _, mut row, previous_rank))| {
                let rank = idx as i32 + 1;
                row.rank = rank;
                row.rank_change = Some(if previous_rank > 0 { previous_rank - rank } else { 0 });
                row
            })
            .collect();

        Ok(self.finish(data, Phase::Qualification, false, standings.len(), rows))
    }

    async fn elimination(&self, data: &GameweekData) -> Result<PhaseStandings> {
        let gameweek = data.gameweek();
        let registry = self.ensure_registry().await?;
        let already_finalized = self
            .store
            .elimination_exists(&self.config.key, gameweek)
            .await?;

        let competing = registry.competing(gameweek);
        let entries: Vec<EntryId> = competing.iter().map(|m| m.entry_id).collect();
        let outcomes = self.score(data, &entries).await;
        let complete = outcomes.values().all(|o| !o.is_unavailable());

        // Lowest score first; equal scores put the better qualifier at risk first.
        let mut risk: Vec<(&QualifiedManager, Option<&EntryOutcome>)> = competing
            .into_iter()
            .map(|m| (m, outcomes.get(&m.entry_id)))
            .collect();
        risk.sort_by_key(|(m, outcome)| {
            (
                outcome.and_then(|o| o.points()).unwrap_or(0),
                m.qualification_rank,
            )
        });

        let active = risk.len();
        let zone: HashSet<EntryId> = if already_finalized {
            self.store
                .eliminations(&self.config.key, gameweek)
                .await?
                .into_iter()
                .map(|e| e.entry_id)
                .collect()
        } else {
            risk.iter()
                .take(self.config.elimination_cohort.min(active))
                .map(|(m, _)| m.entry_id)
                .collect()
        };

        let mut rows: Vec<StandingRow> = risk
            .iter()
            .enumerate()
            .map(|(idx, (manager, outcome))| {
                let (points, captain, chip) = describe(data, *outcome);
                StandingRow {
                    entry: manager.entry_id,
                    manager_name: manager.manager_name.clone(),
                    team_name: manager.team_name.clone(),
                    rank: (active - idx) as i32,
                    gameweek_points: points,
                    total_points: None,
                    rank_change: None,
                    captain,
                    chip,
                    qualification_rank: Some(manager.qualification_rank),
                    in_elimination_zone: zone.contains(&manager.entry_id),
                }
            })
            .collect();
        rows.sort_by_key(|r| r.rank);

        let conclusive = complete && data.snapshot.all_finished();
        let mut finalized = already_finalized;
        let mut remaining = registry.survivors().len();

        // A later gameweek is already settled; this one can no longer be finalized.
        let superseded = registry
            .managers()
            .iter()
            .any(|m| m.eliminated_gw.is_some_and(|gw| gw > gameweek));

        if !already_finalized && conclusive && superseded {
            warn!(league = %self.config.key, gameweek, "Later elimination already finalized");
        } else if !already_finalized && conclusive {
            let eliminated: Vec<EliminationRecord> = rows
                .iter()
                .filter(|r| r.in_elimination_zone)
                .map(|r| EliminationRecord {
                    league_key: self.config.key.clone(),
                    gameweek,
                    entry_id: r.entry,
                    manager_name: r.manager_name.clone(),
                    team_name: r.team_name.clone(),
                    gameweek_points: r.gameweek_points.unwrap_or(0),
                    gameweek_rank: r.rank,
                })
                .collect();

            if self
                .store
                .finalize_elimination(&self.config.key, gameweek, &eliminated)
                .await?
            {
                info!(
                    league = %self.config.key,
                    gameweek,
                    eliminated = eliminated.len(),
                    "Elimination finalized"
                );
                remaining = remaining.saturating_sub(eliminated.len());
            }
            finalized = true;
        } else if !conclusive {
            debug!(league = %self.config.key, gameweek, complete, "Elimination not yet conclusive");
        }

        Ok(self.finish(data, Phase::Elimination, finalized, remaining, rows))
    }

    async fn championship(&self, data: &GameweekData) -> Result<PhaseStandings> {
        let registry = self.ensure_registry().await?;
        let survivors = registry.survivors();
        let entries: Vec<EntryId> = survivors.iter().map(|m| m.entry_id).collect();
        let outcomes = self.score(data, &entries).await;

        let mut rows: Vec<StandingRow> = survivors
            .iter()
            .map(|manager| {
                let (points, captain, chip) = describe(data, outcomes.get(&manager.entry_id));
                StandingRow {
                    entry: manager.entry_id,
                    manager_name: manager.manager_name.clone(),
                    team_name: manager.team_name.clone(),
                    rank: 0,
                    gameweek_points: points,
                    total_points: None,
                    rank_change: None,
                    captain,
                    chip,
                    qualification_rank: Some(manager.qualification_rank),
                    in_elimination_zone: false,
                }
            })
            .collect();
        rows.sort_by_key(|r| {
            (
                std::cmp::Reverse(r.gameweek_points.unwrap_or(0)),
                r.qualification_rank,
            )
        });
        for (idx, row) in rows.iter_mut().enumerate() {
            row.rank = idx as i32 + 1;
        }

        let concluded =
            data.gameweek() >= self.config.championship_end && data.snapshot.all_finished();
        if concluded {
            info!(league = %self.config.key, remaining = survivors.len(), "Championship concluded");
        }

        Ok(self.finish(data, Phase::Championship, concluded, survivors.len(), rows))
    }

    async fn score(
        &self,
        data: &GameweekData,
        entries: &[EntryId],
    ) -> HashMap<EntryId, EntryOutcome> {
        gameweek::score_entries(self.source, data, &self.calculator, entries, self.concurrency)
            .await
    }

    fn finish(
        &self,
        data: &GameweekData,
        phase: Phase,
        finalized: bool,
        managers_remaining: usize,
        rows: Vec<StandingRow>,
    ) -> PhaseStandings {
        PhaseStandings {
            league_key: self.config.key.clone(),
            phase,
            gameweek: data.gameweek(),
            is_live: data.snapshot.is_live(),
            stale: false,
            finalized,
            managers_remaining,
            rows,
            generated_at: Utc::now(),
        }
    }
}

fn captain_name(data: &GameweekData, captain: Option<i64>) -> Option<String> {
    captain
        .and_then(|id| data.snapshot.web_name(id))
        .map(str::to_string)
}

fn describe(
    data: &GameweekData,
    outcome: Option<&EntryOutcome>,
) -> (Option<i32>, Option<String>, String) {
    match outcome {
        Some(EntryOutcome::Scored { score, .. }) => (
            Some(score.points),
            captain_name(data, score.captain),
            score.chip.label().to_string(),
        ),
        Some(EntryOutcome::NoPicks) => (Some(0), None, String::new()),
        Some(EntryOutcome::Unavailable(_)) | None => (None, None, String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::FixtureState;
    use crate::store::MemoryStore;
    use crate::test_support::{FakeSource, tournament_config};

    const LEAGUE: &str = "cup";

    #[tokio::test]
    async fn test_qualification_swaps_in_live_points() {
        let source = FakeSource::tournament(5, 10..=10);
        let store = MemoryStore::new();
        let config = tournament_config(LEAGUE);
        let controller = TournamentController::new(&config, &source, &store, 4);

        let standings = controller.standings_for(10).await.unwrap();

        assert_eq!(standings.phase, Phase::Qualification);
        assert_eq!(standings.rows.len(), 5);
        // Entry 1: provider total 1999 with 50 published, live 24 - 1 = 23.
        let first = &standings.rows[0];
        assert_eq!(first.entry, 1);
        assert_eq!(first.total_points, Some(1999 - 50 + 23));
        assert_eq!(first.rank_change, Some(0));
        assert_eq!(first.captain.as_deref(), Some("Player 1"));
        assert!(store.qualified(LEAGUE).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_qualification_rank_change() {
        let mut source = FakeSource::tournament(3, 10..=10);
        // Entry 3 gets a big live week and jumps from third to first.
        source.set_transfer_cost(3, 10, -200);
        let store = MemoryStore::new();
        let config = tournament_config(LEAGUE);
        let controller = TournamentController::new(&config, &source, &store, 4);

        let standings = controller.standings_for(10).await.unwrap();

        assert_eq!(standings.rows[0].entry, 3);
        assert_eq!(standings.rows[0].rank_change, Some(2));
        assert_eq!(standings.rows[1].rank_change, Some(-1));
    }

    #[tokio::test]
    async fn test_registry_seeded_once() {
        let mut source = FakeSource::tournament(120, 20..=21);
        let store = MemoryStore::new();
        let mut config = tournament_config(LEAGUE);
        config.defending_champion = Some(110);
        let controller = TournamentController::new(&config, &source, &store, 8);

        let registry = controller.ensure_registry().await.unwrap();
        assert_eq!(registry.len(), 100);
        assert!(registry.get(110).unwrap().is_defending_champion);
        assert!(registry.get(100).is_none());

        // A later ranking change does not reseed.
        source.reverse_classic_ranking();
        let controller = TournamentController::new(&config, &source, &store, 8);
        let again = controller.ensure_registry().await.unwrap();
        assert_eq!(again, registry);
    }

    #[tokio::test]
    async fn test_registry_ignores_first_elimination_gameweek_points() {
        let mut source = FakeSource::tournament(120, 20..=20);
        // Entry 101 missed the cut but vaults into the top 100 on live points.
        source.set_classic_totals(101, 2049, 200);
        let store = MemoryStore::new();
        let config = tournament_config(LEAGUE);
        let controller = TournamentController::new(&config, &source, &store, 8);

        let registry = controller.ensure_registry().await.unwrap();

        assert_eq!(registry.len(), 100);
        assert!(registry.get(101).is_none());
        let last = registry.get(100).unwrap();
        assert_eq!(last.qualification_rank, 100);
        assert_eq!(last.qualification_total, 1850);
        assert_eq!(registry.get(1).unwrap().qualification_total, 1949);
    }

    #[tokio::test]
    async fn test_elimination_zone_and_finalization() {
        let source = FakeSource::tournament(120, 20..=21);
        let store = MemoryStore::new();
        let config = tournament_config(LEAGUE);
        let controller = TournamentController::new(&config, &source, &store, 8);

        let standings = controller.standings_for(20).await.unwrap();

        assert_eq!(standings.phase, Phase::Elimination);
        assert!(standings.finalized);
        assert_eq!(standings.rows.len(), 100);
        assert_eq!(standings.managers_remaining, 94);

        // Entry e scores 24 - e, so the six weakest qualifiers go out.
        let zone: Vec<EntryId> = standings
            .rows
            .iter()
            .filter(|r| r.in_elimination_zone)
            .map(|r| r.entry)
            .collect();
        assert_eq!(zone, vec![95, 96, 97, 98, 99, 100]);
        assert_eq!(standings.rows[0].entry, 1);
        assert_eq!(standings.rows[0].rank, 1);
        assert_eq!(standings.rows[99].rank, 100);

        let eliminated = store.eliminations(LEAGUE, 20).await.unwrap();
        assert_eq!(eliminated.len(), 6);
        assert_eq!(eliminated[5].entry_id, 100);
        assert_eq!(eliminated[5].gameweek_rank, 100);
    }

    #[tokio::test]
    async fn test_finalizing_twice_is_a_no_op() {
        let source = FakeSource::tournament(120, 20..=21);
        let store = MemoryStore::new();
        let config = tournament_config(LEAGUE);
        let controller = TournamentController::new(&config, &source, &store, 8);

        let first = controller.standings_for(20).await.unwrap();
        let second = controller.standings_for(20).await.unwrap();

        assert_eq!(second.managers_remaining, 94);
        assert_eq!(first.rows, second.rows);
        assert_eq!(store.eliminations(LEAGUE, 20).await.unwrap().len(), 6);
        let registry = controller.ensure_registry().await.unwrap();
        assert_eq!(registry.survivors().len(), 94);
    }

    #[tokio::test]
    async fn test_registry_shrinks_by_cohort_each_gameweek() {
        let source = FakeSource::tournament(120, 20..=22);
        let store = MemoryStore::new();
        let config = tournament_config(LEAGUE);
        let controller = TournamentController::new(&config, &source, &store, 8);

        let mut remaining = Vec::new();
        for gameweek in 20..=22 {
            remaining.push(controller.standings_for(gameweek).await.unwrap().managers_remaining);
        }

        assert_eq!(remaining, vec![94, 88, 82]);
        let gw21 = store.eliminations(LEAGUE, 21).await.unwrap();
        let ids: HashSet<EntryId> = gw21.iter().map(|e| e.entry_id).collect();
        assert_eq!(ids, HashSet::from([89, 90, 91, 92, 93, 94]));
    }

    #[tokio::test]
    async fn test_earlier_gameweek_not_finalized_after_later_one() {
        let source = FakeSource::tournament(120, 20..=21);
        let store = MemoryStore::new();
        let config = tournament_config(LEAGUE);
        let controller = TournamentController::new(&config, &source, &store, 8);

        assert!(controller.standings_for(21).await.unwrap().finalized);
        let earlier = controller.standings_for(20).await.unwrap();

        assert!(!earlier.finalized);
        assert_eq!(earlier.managers_remaining, 94);
        assert!(!store.elimination_exists(LEAGUE, 20).await.unwrap());
    }

    #[tokio::test]
    async fn test_live_gameweek_is_not_finalized() {
        let mut source = FakeSource::tournament(120, 20..=20);
        source.set_fixture_state(20, FixtureState::FinishedProvisional);
        let store = MemoryStore::new();
        let config = tournament_config(LEAGUE);
        let controller = TournamentController::new(&config, &source, &store, 8);

        let standings = controller.standings_for(20).await.unwrap();

        assert!(!standings.finalized);
        assert_eq!(standings.managers_remaining, 100);
        assert_eq!(standings.rows.iter().filter(|r| r.in_elimination_zone).count(), 6);
        assert!(!store.elimination_exists(LEAGUE, 20).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_roster_blocks_finalization() {
        let mut source = FakeSource::tournament(120, 20..=20);
        source.fail_roster(50, 20);
        let store = MemoryStore::new();
        let config = tournament_config(LEAGUE);
        let controller = TournamentController::new(&config, &source, &store, 8);

        let standings = controller.standings_for(20).await.unwrap();

        assert!(!standings.finalized);
        let row = standings.rows.iter().find(|r| r.entry == 50).unwrap();
        assert_eq!(row.gameweek_points, None);
    }

    #[tokio::test]
    async fn test_tied_scores_put_better_qualifier_at_risk_first() {
        let mut source = FakeSource::tournament(120, 20..=20);
        // Entries 10 and 100 tie on the lowest score of the week.
        source.set_transfer_cost(10, 20, 500);
        source.set_transfer_cost(100, 20, 500);
        let store = MemoryStore::new();
        let mut config = tournament_config(LEAGUE);
        config.elimination_cohort = 1;
        let controller = TournamentController::new(&config, &source, &store, 8);

        let standings = controller.standings_for(20).await.unwrap();

        let zone: Vec<EntryId> = standings
            .rows
            .iter()
            .filter(|r| r.in_elimination_zone)
            .map(|r| r.entry)
            .collect();
        assert_eq!(zone, vec![10]);
    }

    #[tokio::test]
    async fn test_championship_tracks_survivors() {
        let source = FakeSource::tournament(120, 20..=34);
        let store = MemoryStore::new();
        let config = tournament_config(LEAGUE);
        let controller = TournamentController::new(&config, &source, &store, 8);

        for gameweek in 20..=33 {
            controller.standings_for(gameweek).await.unwrap();
        }
        let standings = controller.standings_for(34).await.unwrap();

        assert_eq!(standings.phase, Phase::Championship);
        assert_eq!(standings.managers_remaining, 100 - 14 * 6);
        assert_eq!(standings.rows.len(), 16);
        assert_eq!(standings.rows[0].entry, 1);
    }

    #[tokio::test]
    async fn test_championship_concludes_on_last_gameweek() {
        let mut source = FakeSource::tournament(120, 36..=37);
        let store = MemoryStore::new();
        let config = tournament_config(LEAGUE);
        let controller = TournamentController::new(&config, &source, &store, 8);

        assert!(!controller.standings_for(36).await.unwrap().finalized);
        assert!(controller.standings_for(37).await.unwrap().finalized);

        source.set_fixture_state(37, FixtureState::Started);
        let controller = TournamentController::new(&config, &source, &store, 8);
        let live = controller.standings_for(37).await.unwrap();
        assert_eq!(live.phase, Phase::Championship);
        assert!(!live.finalized);
    }

    #[tokio::test]
    async fn test_stale_cache_when_provider_down() {
        let store = MemoryStore::new();
        let config = tournament_config(LEAGUE);
        let handle = LeagueHandle::new(LEAGUE);

        let source = FakeSource::tournament(5, 10..=10);
        let fresh = TournamentController::new(&config, &source, &store, 4)
            .standings(&handle)
            .await
            .unwrap();
        assert!(!fresh.stale);

        let mut down = FakeSource::tournament(5, 10..=10);
        down.fail_events();
        let served = TournamentController::new(&config, &down, &store, 4)
            .standings(&handle)
            .await
            .unwrap();

        assert!(served.stale);
        assert_eq!(served.rows, fresh.rows);
    }

    #[tokio::test]
    async fn test_no_cache_surfaces_data_unavailable() {
        let store = MemoryStore::new();
        let config = tournament_config(LEAGUE);
        let handle = LeagueHandle::new(LEAGUE);
        let mut down = FakeSource::tournament(5, 10..=10);
        down.fail_snapshot(10);

        let err = TournamentController::new(&config, &down, &store, 4)
            .standings(&handle)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::DataUnavailable(_)));
    }
}
