//! Provisional bonus points for fixtures whose official bonus is not yet published.

use std::collections::HashMap;

use crate::snapshot::{FixtureState, PlayerId, StatsSnapshot};

/// Awards by finishing tier; nothing below third.
const TIER_AWARDS: [i32; 3] = [3, 2, 1];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BonusTable {
    projected: HashMap<PlayerId, i32>,
}

impl BonusTable {
    pub fn get(&self, player: PlayerId) -> i32 {
        self.projected.get(&player).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.projected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projected.is_empty()
    }

    /// Official bonus wins whenever the provider has published one.
    pub fn effective_points(&self, snapshot: &StatsSnapshot, player: PlayerId) -> i32 {
        let stat = snapshot.stat(player);
        if stat.bonus != 0 {
            stat.points
        } else {
            stat.points + self.get(player)
        }
    }
}

/// Rank one fixture's bps lines into tier awards.
///
/// Tied players share the award of the tier they land on and the position counter skips past
/// the whole group, so `[40, 40, 30, 20]` yields `[3, 3, 1, 0]`.
pub fn rank_fixture(bps: &[(PlayerId, i32)]) -> Vec<(PlayerId, i32)> {
    let mut sorted: Vec<(PlayerId, i32)> = bps.to_vec();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));

    let mut awards = Vec::new();
    let mut position = 0usize;
    let mut idx = 0usize;

    while idx < sorted.len() && position < TIER_AWARDS.len() {
        let value = sorted[idx].1;
        let group_end = sorted[idx..]
            .iter()
            .position(|(_, v)| *v != value)
            .map_or(sorted.len(), |offset| idx + offset);

        let award = TIER_AWARDS[position];
        for (player, _) in &sorted[idx..group_end] {
            awards.push((*player, award));
        }

        position += group_end - idx;
        idx = group_end;
    }

    awards
}

/// Project bonus for every started fixture that has not been officially closed.
pub fn project(snapshot: &StatsSnapshot) -> BonusTable {
    let mut projected: HashMap<PlayerId, i32> = HashMap::new();

    for fixture in &snapshot.fixtures {
        if !fixture.state.has_started() || fixture.state == FixtureState::Finished {
            continue;
        }
        for (player, award) in rank_fixture(&fixture.bps) {
            *projected.entry(player).or_insert(0) += award;
        }
    }

    BonusTable { projected }
}
