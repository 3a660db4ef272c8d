//! Builders and an in-memory statistics source shared by the engine's tests.

use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;

use async_trait::async_trait;

use crate::config::{H2hLeagueConfig, LeagueTeam, TournamentConfig};
use crate::error::SourceError;
use crate::scoring::ScoringRules;
use crate::snapshot::{
    Chip, EntryId, Fixture, FixtureState, Gameweek, LivePlayerStat, Pick, Player, PlayerId,
    Position, Roster, StatsSnapshot, TeamId,
};
use crate::source::{ClassicStanding, EventStatus, H2hPairing, LeagueEntry, StatsSource};

pub struct SnapshotBuilder {
    snapshot: StatsSnapshot,
}

impl SnapshotBuilder {
    pub fn new(gameweek: Gameweek) -> Self {
        Self {
            snapshot: StatsSnapshot {
                gameweek,
                ..StatsSnapshot::default()
            },
        }
    }

    pub fn player(mut self, id: PlayerId, team: TeamId, position: Position) -> Self {
        self.snapshot.players.insert(
            id,
            Player {
                id,
                web_name: format!("Player {id}"),
                team,
                position,
            },
        );
        self
    }

    /// Players 1-11 in a 4-4-2 on `starter_team`, bench 12 GK, 13 DEF, 14 MID, 15 FWD.
    pub fn squad_443(self, starter_team: TeamId, bench_team: TeamId) -> Self {
        self.squad(
            starter_team,
            bench_team,
            &[(1, 1), (2, 4), (6, 4), (10, 2)],
            &[
                Position::Goalkeeper,
                Position::Defender,
                Position::Midfielder,
                Position::Forward,
            ],
        )
    }

    /// Players 1-11 in a 3-5-2 on `starter_team`, bench 12 GK, 13 MID, 14 DEF, 15 FWD.
    pub fn squad_352(self, starter_team: TeamId, bench_team: TeamId) -> Self {
        self.squad(
            starter_team,
            bench_team,
            &[(1, 1), (2, 3), (5, 5), (10, 2)],
            &[
                Position::Goalkeeper,
                Position::Midfielder,
                Position::Defender,
                Position::Forward,
            ],
        )
    }

    fn squad(
        mut self,
        starter_team: TeamId,
        bench_team: TeamId,
        starters: &[(PlayerId, usize)],
        bench: &[Position],
    ) -> Self {
        let lines = [
            Position::Goalkeeper,
            Position::Defender,
            Position::Midfielder,
            Position::Forward,
        ];
        for ((first, count), position) in starters.iter().zip(lines) {
            for id in *first..*first + *count as PlayerId {
                self = self.player(id, starter_team, position);
            }
        }
        for (offset, position) in bench.iter().enumerate() {
            self = self.player(12 + offset as PlayerId, bench_team, *position);
        }
        self
    }

    pub fn move_to_team(mut self, id: PlayerId, team: TeamId) -> Self {
        if let Some(player) = self.snapshot.players.get_mut(&id) {
            player.team = team;
        }
        self
    }

    pub fn fixture(self, id: i64, home: TeamId, away: TeamId, state: FixtureState) -> Self {
        self.fixture_with_bps(id, home, away, state, &[])
    }

    pub fn fixture_with_bps(
        mut self,
        id: i64,
        home: TeamId,
        away: TeamId,
        state: FixtureState,
        bps: &[(PlayerId, i32)],
    ) -> Self {
        self.snapshot.fixtures.push(Fixture {
            id,
            home_team: home,
            away_team: away,
            state,
            bps: bps.to_vec(),
        });
        self
    }

    pub fn stat(mut self, id: PlayerId, stat: LivePlayerStat) -> Self {
        self.snapshot.live.insert(id, stat);
        self
    }

    pub fn played(self, id: PlayerId, minutes: i32, points: i32) -> Self {
        self.stat(
            id,
            LivePlayerStat {
                points,
                minutes,
                bonus: 0,
                bps: 0,
            },
        )
    }

    /// Every player known so far gets the same line.
    pub fn all_played(mut self, minutes: i32, points: i32) -> Self {
        let ids: Vec<PlayerId> = self.snapshot.players.keys().copied().collect();
        for id in ids {
            self = self.played(id, minutes, points);
        }
        self
    }

    pub fn build(self) -> StatsSnapshot {
        self.snapshot
    }
}

fn roster(entry: EntryId, captain: PlayerId, vice_captain: PlayerId) -> Roster {
    Roster {
        entry,
        gameweek: 1,
        picks: (1..=15)
            .map(|element| Pick {
                element,
                is_captain: element == captain,
                is_vice_captain: element == vice_captain,
            })
            .collect(),
        chip: Chip::None,
        transfer_cost: 0,
        provider_points: 0,
        provider_total: 0,
    }
}

/// Picks 1-15 in order, matching [`SnapshotBuilder::squad_443`].
pub fn roster_443(entry: EntryId, captain: PlayerId, vice_captain: PlayerId) -> Roster {
    roster(entry, captain, vice_captain)
}

/// Picks 1-15 in order, matching [`SnapshotBuilder::squad_352`].
pub fn roster_352(entry: EntryId, captain: PlayerId, vice_captain: PlayerId) -> Roster {
    roster(entry, captain, vice_captain)
}

/// Entries 1..=count ranked by id, entry `e` on `2000 - e` points.
pub fn classic_standings(count: i64) -> Vec<ClassicStanding> {
    (1..=count)
        .map(|entry| ClassicStanding {
            entry,
            player_name: format!("Manager {entry}"),
            entry_name: format!("Team {entry}"),
            rank: entry as i32,
            last_rank: Some(entry as i32),
            total: 2000 - entry as i32,
            event_total: 50,
        })
        .collect()
}

pub fn tournament_config(key: &str) -> TournamentConfig {
    TournamentConfig {
        key: key.to_string(),
        league_id: 7,
        qualification_end: 19,
        elimination_end: 33,
        championship_end: 37,
        qualified_count: 100,
        elimination_cohort: 6,
        defending_champion: None,
        rules: ScoringRules::default(),
    }
}

/// Four single-entry teams: team `i` fields entry `11 * i`.
pub fn h2h_config(key: &str, baseline_gameweek: Gameweek) -> H2hLeagueConfig {
    H2hLeagueConfig {
        key: key.to_string(),
        h2h_league_id: 1,
        baseline_gameweek,
        teams: (1..=4)
            .map(|id| LeagueTeam {
                id,
                name: format!("Team {id}"),
                entries: vec![11 * id],
            })
            .collect(),
        rules: ScoringRules::default(),
    }
}

/// A scripted provider. Every entry shares the squad from [`SnapshotBuilder::squad_443`];
/// entries are told apart by their transfer cost.
#[derive(Default)]
pub struct FakeSource {
    events: Vec<EventStatus>,
    snapshots: HashMap<Gameweek, StatsSnapshot>,
    rosters: HashMap<(EntryId, Gameweek), Roster>,
    failing_rosters: HashSet<(EntryId, Gameweek)>,
    failing_snapshots: HashSet<Gameweek>,
    events_down: bool,
    classic: Vec<ClassicStanding>,
    entries: Vec<LeagueEntry>,
    pairings: HashMap<Gameweek, Vec<H2hPairing>>,
}

impl FakeSource {
    fn season(current: Gameweek) -> Self {
        let events = (1..=38)
            .map(|gameweek| EventStatus {
                gameweek,
                is_current: gameweek == current,
                finished: gameweek < current,
            })
            .collect();
        Self {
            events,
            ..Self::default()
        }
    }

    fn gameweek_snapshot(gameweek: Gameweek, state: FixtureState, points: i32) -> StatsSnapshot {
        SnapshotBuilder::new(gameweek)
            .squad_443(100, 200)
            .fixture(1, 100, 300, state)
            .fixture(2, 200, 400, state)
            .all_played(90, points)
            .build()
    }

    fn add_roster(&mut self, entry: EntryId, gameweek: Gameweek, transfer_cost: i32) {
        let mut roster = roster_443(entry, 1, 2);
        roster.gameweek = gameweek;
        roster.transfer_cost = transfer_cost;
        roster.provider_points = 50;
        self.rosters.insert((entry, gameweek), roster);
    }

    /// An individual-entry H2H league of four (entries 11, 22, 33, 44) paired 11 v 22 and
    /// 33 v 44 every week. Gameweeks before `current` are finished; `current` is in play.
    pub fn h2h_season(current: Gameweek) -> Self {
        let mut source = Self::season(current);
        let costs = [(11, 0), (22, 24), (33, 12), (44, 36)];

        for gameweek in 1..=current {
            let state = if gameweek < current {
                FixtureState::Finished
            } else {
                FixtureState::Started
            };
            source
                .snapshots
                .insert(gameweek, Self::gameweek_snapshot(gameweek, state, 4));
            for (entry, cost) in costs {
                source.add_roster(entry, gameweek, cost);
            }
            source.pairings.insert(
                gameweek,
                vec![
                    H2hPairing {
                        entry_1: Some(11),
                        entry_2: Some(22),
                    },
                    H2hPairing {
                        entry_1: Some(44),
                        entry_2: Some(33),
                    },
                ],
            );
        }
        source.entries = costs
            .iter()
            .map(|(entry, _)| LeagueEntry {
                entry: *entry,
                player_name: format!("Manager {entry}"),
                entry_name: format!("Team {}", entry / 11),
            })
            .collect();
        source
    }

    /// A classic league of `entries` managers; entry `e` is ranked `e` and scores `24 - e` in
    /// each of `gameweeks`, all of which are officially finished.
    pub fn tournament(entries: i64, gameweeks: RangeInclusive<Gameweek>) -> Self {
        let mut source = Self::season(*gameweeks.end());
        source.classic = classic_standings(entries);

        for gameweek in gameweeks {
            source.snapshots.insert(
                gameweek,
                Self::gameweek_snapshot(gameweek, FixtureState::Finished, 2),
            );
            for entry in 1..=entries {
                source.add_roster(entry, gameweek, entry as i32);
            }
        }
        source
    }

    pub fn events_list(&self) -> Vec<EventStatus> {
        self.events.clone()
    }

    pub fn finish_gameweek(&mut self, gameweek: Gameweek) {
        self.set_fixture_state(gameweek, FixtureState::Finished);
        for event in &mut self.events {
            if event.gameweek == gameweek {
                event.finished = true;
            }
        }
    }

    pub fn set_fixture_state(&mut self, gameweek: Gameweek, state: FixtureState) {
        if let Some(snapshot) = self.snapshots.get_mut(&gameweek) {
            for fixture in &mut snapshot.fixtures {
                fixture.state = state;
            }
        }
    }

    pub fn set_transfer_cost(&mut self, entry: EntryId, gameweek: Gameweek, cost: i32) {
        if let Some(roster) = self.rosters.get_mut(&(entry, gameweek)) {
            roster.transfer_cost = cost;
        }
    }

    pub fn reverse_classic_ranking(&mut self) {
        let count = self.classic.len() as i32;
        for standing in &mut self.classic {
            standing.rank = count + 1 - standing.rank;
        }
    }

    /// Overwrite an entry's classic totals and re-rank by total, as the provider does live.
    pub fn set_classic_totals(&mut self, entry: EntryId, total: i32, event_total: i32) {
        for standing in &mut self.classic {
            if standing.entry == entry {
                standing.total = total;
                standing.event_total = event_total;
            }
        }
        self.classic.sort_by_key(|s| (std::cmp::Reverse(s.total), s.entry));
        for (idx, standing) in self.classic.iter_mut().enumerate() {
            standing.rank = idx as i32 + 1;
        }
    }

    pub fn remove_roster(&mut self, entry: EntryId, gameweek: Gameweek) {
        self.rosters.remove(&(entry, gameweek));
    }

    pub fn fail_roster(&mut self, entry: EntryId, gameweek: Gameweek) {
        self.failing_rosters.insert((entry, gameweek));
    }

    pub fn fail_snapshot(&mut self, gameweek: Gameweek) {
        self.failing_snapshots.insert(gameweek);
    }

    pub fn fail_events(&mut self) {
        self.events_down = true;
    }
}

fn unavailable(what: String) -> SourceError {
    SourceError::Unavailable(what)
}

#[async_trait]
impl StatsSource for FakeSource {
    async fn events(&self) -> Result<Vec<EventStatus>, SourceError> {
        if self.events_down {
            return Err(unavailable("bootstrap".to_string()));
        }
        Ok(self.events.clone())
    }

    async fn snapshot(&self, gameweek: Gameweek) -> Result<StatsSnapshot, SourceError> {
        if self.failing_snapshots.contains(&gameweek) {
            return Err(unavailable(format!("live gameweek {gameweek}")));
        }
        self.snapshots
            .get(&gameweek)
            .cloned()
            .ok_or_else(|| unavailable(format!("no snapshot for gameweek {gameweek}")))
    }

    async fn roster(
        &self,
        entry: EntryId,
        gameweek: Gameweek,
    ) -> Result<Option<Roster>, SourceError> {
        if self.failing_rosters.contains(&(entry, gameweek)) {
            return Err(unavailable(format!("picks for {entry} in {gameweek}")));
        }
        Ok(self.rosters.get(&(entry, gameweek)).cloned())
    }

    async fn classic_standings(&self, _league_id: i64) -> Result<Vec<ClassicStanding>, SourceError> {
        Ok(self.classic.clone())
    }

    async fn h2h_entries(&self, _league_id: i64) -> Result<Vec<LeagueEntry>, SourceError> {
        Ok(self.entries.clone())
    }

    async fn h2h_pairings(
        &self,
        _league_id: i64,
        gameweek: Gameweek,
    ) -> Result<Vec<H2hPairing>, SourceError> {
        Ok(self.pairings.get(&gameweek).cloned().unwrap_or_default())
    }
}
