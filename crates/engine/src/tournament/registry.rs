use std::cmp::Reverse;

use storage::models::QualifiedManager;

use crate::snapshot::{EntryId, Gameweek};
use crate::source::ClassicStanding;

/// Managers who made the cut, ordered by qualification rank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualifiedRegistry {
    managers: Vec<QualifiedManager>,
}

impl QualifiedRegistry {
    pub fn new(mut managers: Vec<QualifiedManager>) -> Self {
        managers.sort_by_key(|m| (m.qualification_rank, m.entry_id));
        Self { managers }
    }

    pub fn len(&self) -> usize {
        self.managers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }

    pub fn managers(&self) -> &[QualifiedManager] {
        &self.managers
    }

    pub fn get(&self, entry: EntryId) -> Option<&QualifiedManager> {
        self.managers.iter().find(|m| m.entry_id == entry)
    }

    /// Managers still playing in `gameweek`, including those knocked out at its end.
    pub fn competing(&self, gameweek: Gameweek) -> Vec<&QualifiedManager> {
        self.managers
            .iter()
            .filter(|m| m.eliminated_gw.is_none_or(|gw| gw >= gameweek))
            .collect()
    }

    /// Managers not yet eliminated.
    pub fn survivors(&self) -> Vec<&QualifiedManager> {
        self.managers
            .iter()
            .filter(|m| m.eliminated_gw.is_none())
            .collect()
    }
}

/// The classic ranking with the provider's current gameweek taken back out of every total.
///
/// Only the current gameweek's points are published per entry, so this restores the final
/// qualification ranking exactly while the first elimination gameweek is current.
pub fn rewind_current_gameweek(standings: &[ClassicStanding]) -> Vec<ClassicStanding> {
    let mut rewound: Vec<ClassicStanding> = standings
        .iter()
        .cloned()
        .map(|mut s| {
            s.total -= s.event_total;
            s
        })
        .collect();
    rewound.sort_by_key(|s| (Reverse(s.total), s.rank, s.entry));
    for (idx, standing) in rewound.iter_mut().enumerate() {
        standing.rank = idx as i32 + 1;
    }
    rewound
}

/// Pick the qualifiers from the final qualification ranking.
///
/// The top `cutoff` qualify, except that a defending champion ranked outside the cut takes the
/// last place. A champion missing from the ranking is ignored.
pub fn select_qualifiers(
    league_key: &str,
    standings: &[ClassicStanding],
    cutoff: usize,
    defending_champion: Option<EntryId>,
) -> Vec<QualifiedManager> {
    let mut ranked: Vec<&ClassicStanding> = standings.iter().collect();
    ranked.sort_by_key(|s| (s.rank, s.entry));

    let champion_outside = defending_champion.and_then(|champion| {
        ranked
            .iter()
            .position(|s| s.entry == champion)
            .filter(|idx| *idx >= cutoff)
    });

    let mut selected: Vec<&ClassicStanding> = match champion_outside {
        Some(idx) => {
            let mut top: Vec<&ClassicStanding> =
                ranked.iter().take(cutoff.saturating_sub(1)).copied().collect();
            top.push(ranked[idx]);
            top
        }
        None => ranked.into_iter().take(cutoff).collect(),
    };
    selected.dedup_by_key(|s| s.entry);

    selected
        .into_iter()
        .map(|s| QualifiedManager {
            league_key: league_key.to_string(),
            entry_id: s.entry,
            manager_name: s.player_name.clone(),
            team_name: s.entry_name.clone(),
            qualification_rank: s.rank,
            qualification_total: s.total,
            is_defending_champion: Some(s.entry) == defending_champion,
            eliminated_gw: None,
            final_rank: None,
        })
        .collect()
}
