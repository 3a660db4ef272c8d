use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::autosub::{self, Substitution};
use crate::bonus::BonusTable;
use crate::snapshot::{Chip, EntryId, PlayerId, Roster, SQUAD_SIZE, StatsSnapshot};

/// Which chip effects and projections a league honours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub triple_captain: bool,
    pub bench_boost: bool,
    pub project_bonus: bool,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            triple_captain: true,
            bench_boost: true,
            project_bonus: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterIssue {
    WrongSquadSize(usize),
    NoCaptain,
    MultipleCaptains,
    NoViceCaptain,
    MultipleViceCaptains,
    CaptainIsViceCaptain,
}

/// Who holds the armband for this evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Captaincy {
    Captain { player: PlayerId, multiplier: i32 },
    ViceCaptain { player: PlayerId, multiplier: i32 },
    /// Captain's team still has a fixture to come; credited at 1x for now.
    Pending { player: PlayerId },
    /// Captain blanked and the vice-captain may still play.
    ViceCaptainPending { player: PlayerId },
    Blanked,
    Unresolved,
}

impl Captaincy {
    pub fn holder(&self) -> Option<(PlayerId, i32)> {
        match *self {
            Captaincy::Captain { player, multiplier }
            | Captaincy::ViceCaptain { player, multiplier } => Some((player, multiplier)),
            _ => None,
        }
    }

    fn multiplier_for(&self, player: PlayerId) -> i32 {
        match self.holder() {
            Some((holder, multiplier)) if holder == player => multiplier,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveScore {
    pub entry: EntryId,
    /// Net of transfer cost.
    pub points: i32,
    pub gross_points: i32,
    pub transfer_cost: i32,
    pub captain: Option<PlayerId>,
    pub captaincy: Captaincy,
    pub chip: Chip,
    pub bench_boost_applied: bool,
    pub substitutions: Vec<Substitution>,
    pub reserved: Vec<PlayerId>,
    pub issues: Vec<RosterIssue>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LiveScoringCalculator {
    rules: ScoringRules,
}

impl LiveScoringCalculator {
    pub fn new(rules: ScoringRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> ScoringRules {
        self.rules
    }

    /// Score one roster against the current state of the gameweek.
    pub fn score(&self, roster: &Roster, snapshot: &StatsSnapshot, bonus: &BonusTable) -> LiveScore {
        let points_of = |player: PlayerId| {
            if self.rules.project_bonus {
                bonus.effective_points(snapshot, player)
            } else {
                snapshot.stat(player).points
            }
        };

        let (captain, vice_captain, issues) = resolve_armbands(roster);
        for issue in &issues {
            warn!(entry = roster.entry, gameweek = roster.gameweek, issue = ?issue, "Roster data issue");
        }

        let captaincy = self.captaincy(roster, snapshot, captain, vice_captain);

        let bench_boost_applied = roster.chip == Chip::BenchBoost && self.rules.bench_boost;
        let counted = if bench_boost_applied {
            &roster.picks[..]
        } else {
            roster.starters()
        };

        let mut gross: i32 = counted
            .iter()
            .map(|pick| points_of(pick.element) * captaincy.multiplier_for(pick.element))
            .sum();

        let mut substitutions = Vec::new();
        let mut reserved = Vec::new();
        if !bench_boost_applied {
            let report = autosub::simulate(roster, snapshot, points_of);
            gross += report.points;
            if let Some((holder, multiplier)) = captaincy.holder()
                && let Some(sub_points) = report.points_for(holder)
            {
                gross += sub_points * (multiplier - 1);
            }
            substitutions = report.substitutions;
            reserved = report.reserved;
        }

        LiveScore {
            entry: roster.entry,
            points: gross - roster.transfer_cost,
            gross_points: gross,
            transfer_cost: roster.transfer_cost,
            captain,
            captaincy,
            chip: roster.chip.clone(),
            bench_boost_applied,
            substitutions,
            reserved,
            issues,
        }
    }

    fn captaincy(
        &self,
        roster: &Roster,
        snapshot: &StatsSnapshot,
        captain: Option<PlayerId>,
        vice_captain: Option<PlayerId>,
    ) -> Captaincy {
        let Some(captain) = captain else {
            return Captaincy::Unresolved;
        };
        let multiplier = if roster.chip == Chip::TripleCaptain && self.rules.triple_captain {
            3
        } else {
            2
        };

        if snapshot.minutes(captain) > 0 {
            return Captaincy::Captain {
                player: captain,
                multiplier,
            };
        }
        if !snapshot.player_team_done(captain) {
            return Captaincy::Pending { player: captain };
        }

        match vice_captain {
            Some(vice) if snapshot.minutes(vice) > 0 => Captaincy::ViceCaptain {
                player: vice,
                multiplier,
            },
            Some(vice) if !snapshot.player_team_done(vice) => {
                Captaincy::ViceCaptainPending { player: vice }
            }
            _ => Captaincy::Blanked,
        }
    }
}

fn resolve_armbands(roster: &Roster) -> (Option<PlayerId>, Option<PlayerId>, Vec<RosterIssue>) {
    let mut issues = Vec::new();
    if roster.picks.len() != SQUAD_SIZE {
        issues.push(RosterIssue::WrongSquadSize(roster.picks.len()));
    }

    let captains: Vec<PlayerId> = roster
        .picks
        .iter()
        .filter(|p| p.is_captain)
        .map(|p| p.element)
        .collect();
    let vices: Vec<PlayerId> = roster
        .picks
        .iter()
        .filter(|p| p.is_vice_captain)
        .map(|p| p.element)
        .collect();

    let captain = match captains.as_slice() {
        [only] => Some(*only),
        [] => {
            issues.push(RosterIssue::NoCaptain);
            None
        }
        _ => {
            issues.push(RosterIssue::MultipleCaptains);
            None
        }
    };

    let vice_captain = match vices.as_slice() {
        [only] if Some(*only) == captain => {
            issues.push(RosterIssue::CaptainIsViceCaptain);
            None
        }
        [only] => Some(*only),
        [] => {
            issues.push(RosterIssue::NoViceCaptain);
            None
        }
        _ => {
            issues.push(RosterIssue::MultipleViceCaptains);
            None
        }
    };

    (captain, vice_captain, issues)
}
