use std::collections::HashMap;

use engine::snapshot::{
    Chip, Fixture, FixtureState, Gameweek, LivePlayerStat, Pick, Player, Position, Roster,
    StatsSnapshot,
};
use engine::source::{ClassicStanding, EventStatus, H2hPairing, LeagueEntry};
use tracing::warn;

use crate::models::*;

pub fn events(bootstrap: &Bootstrap) -> Vec<EventStatus> {
    bootstrap
        .events
        .iter()
        .map(|e| EventStatus {
            gameweek: e.id,
            is_current: e.is_current,
            finished: e.finished,
        })
        .collect()
}

pub fn players(elements: &[ElementData]) -> HashMap<i64, Player> {
    elements
        .iter()
        .filter_map(|el| match Position::from_element_type(el.element_type) {
            Some(position) => Some((
                el.id,
                Player {
                    id: el.id,
                    web_name: el.web_name.clone(),
                    team: el.team,
                    position,
                },
            )),
            None => {
                warn!(element = el.id, element_type = el.element_type, "Unknown element type");
                None
            }
        })
        .collect()
}

pub fn fixture_state(data: &FixtureData) -> FixtureState {
    if data.finished {
        FixtureState::Finished
    } else if data.finished_provisional {
        FixtureState::FinishedProvisional
    } else if data.started == Some(true) {
        FixtureState::Started
    } else if data.kickoff_time.is_none() {
        FixtureState::Postponed
    } else {
        FixtureState::Pending
    }
}

pub fn fixture(data: &FixtureData) -> Fixture {
    let bps = data
        .stats
        .iter()
        .filter(|s| s.identifier == "bps")
        .flat_map(|s| s.h.iter().chain(s.a.iter()))
        .map(|v| (v.element, v.value))
        .collect();

    Fixture {
        id: data.id,
        home_team: data.team_h,
        away_team: data.team_a,
        state: fixture_state(data),
        bps,
    }
}

pub fn snapshot(
    gameweek: Gameweek,
    bootstrap: &Bootstrap,
    fixtures: &[FixtureData],
    live: &LiveEvent,
) -> StatsSnapshot {
    let live = live
        .elements
        .iter()
        .map(|el| {
            (
                el.id,
                LivePlayerStat {
                    points: el.stats.total_points,
                    minutes: el.stats.minutes,
                    bonus: el.stats.bonus,
                    bps: el.stats.bps,
                },
            )
        })
        .collect();

    StatsSnapshot::new(
        gameweek,
        players(&bootstrap.elements),
        fixtures.iter().map(fixture).collect(),
        live,
    )
}

/// Picks are ordered by squad slot so the first eleven are the starters.
pub fn roster(entry: i64, gameweek: Gameweek, data: &EntryPicks) -> Roster {
    let mut slots = data.picks.clone();
    slots.sort_by_key(|p| p.position);

    Roster {
        entry,
        gameweek,
        picks: slots
            .iter()
            .map(|p| Pick {
                element: p.element,
                is_captain: p.is_captain,
                is_vice_captain: p.is_vice_captain,
            })
            .collect(),
        chip: Chip::from_api(data.active_chip.as_deref()),
        transfer_cost: data.entry_history.event_transfers_cost,
        provider_points: data.entry_history.points,
        provider_total: data.entry_history.total_points,
    }
}

pub fn classic_standing(row: &ClassicRow) -> ClassicStanding {
    ClassicStanding {
        entry: row.entry,
        player_name: row.player_name.clone(),
        entry_name: row.entry_name.clone(),
        rank: row.rank,
        last_rank: row.last_rank,
        total: row.total,
        event_total: row.event_total,
    }
}

pub fn league_entry(row: &H2hRow) -> LeagueEntry {
    LeagueEntry {
        entry: row.entry,
        player_name: row.player_name.clone(),
        entry_name: row.entry_name.clone(),
    }
}

pub fn pairing(row: &H2hMatchRow) -> H2hPairing {
    H2hPairing {
        entry_1: row.entry_1_entry,
        entry_2: row.entry_2_entry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_json(extra: &str) -> FixtureData {
        let json = format!(
            r#"{{"id": 1, "team_h": 3, "team_a": 8, "kickoff_time": "2024-08-17T14:00:00Z" {extra}}}"#
        );
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_fixture_state_mapping() {
        assert_eq!(fixture_state(&fixture_json("")), FixtureState::Pending);
        assert_eq!(
            fixture_state(&fixture_json(r#", "started": true"#)),
            FixtureState::Started
        );
        assert_eq!(
            fixture_state(&fixture_json(r#", "started": true, "finished_provisional": true"#)),
            FixtureState::FinishedProvisional
        );
        assert_eq!(
            fixture_state(&fixture_json(
                r#", "started": true, "finished_provisional": true, "finished": true"#
            )),
            FixtureState::Finished
        );

        let postponed: FixtureData =
            serde_json::from_str(r#"{"id": 2, "team_h": 1, "team_a": 2, "kickoff_time": null}"#)
                .unwrap();
        assert_eq!(fixture_state(&postponed), FixtureState::Postponed);
    }

    #[test]
    fn test_fixture_collects_bps_from_both_sides() {
        let data = fixture_json(
            r#", "started": true, "stats": [
                {"identifier": "goals_scored", "h": [{"element": 10, "value": 1}], "a": []},
                {"identifier": "bps",
                 "h": [{"element": 10, "value": 38}, {"element": 11, "value": 20}],
                 "a": [{"element": 40, "value": 25}]}
            ]"#,
        );

        let fixture = fixture(&data);

        assert_eq!(fixture.home_team, 3);
        assert_eq!(fixture.bps, vec![(10, 38), (11, 20), (40, 25)]);
    }

    #[test]
    fn test_roster_orders_by_squad_slot() {
        let data: EntryPicks = serde_json::from_str(
            r#"{
                "active_chip": "3xc",
                "entry_history": {"points": 61, "total_points": 1200, "event_transfers_cost": 4},
                "picks": [
                    {"element": 300, "position": 12, "is_captain": false, "is_vice_captain": false},
                    {"element": 100, "position": 1, "is_captain": false, "is_vice_captain": true},
                    {"element": 200, "position": 2, "is_captain": true, "is_vice_captain": false}
                ]
            }"#,
        )
        .unwrap();

        let roster = roster(42, 7, &data);

        let order: Vec<i64> = roster.picks.iter().map(|p| p.element).collect();
        assert_eq!(order, vec![100, 200, 300]);
        assert!(roster.picks[1].is_captain);
        assert_eq!(roster.chip, Chip::TripleCaptain);
        assert_eq!(roster.transfer_cost, 4);
        assert_eq!(roster.provider_points, 61);
        assert_eq!(roster.provider_total, 1200);
    }

    #[test]
    fn test_players_skip_unknown_positions() {
        let elements: Vec<ElementData> = serde_json::from_str(
            r#"[
                {"id": 1, "web_name": "Raya", "team": 1, "element_type": 1},
                {"id": 2, "web_name": "Coach", "team": 1, "element_type": 5}
            ]"#,
        )
        .unwrap();

        let players = players(&elements);

        assert_eq!(players.len(), 1);
        assert_eq!(players[&1].position, Position::Goalkeeper);
    }
}
