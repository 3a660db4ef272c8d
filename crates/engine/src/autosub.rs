use std::collections::HashSet;

use serde::Serialize;

use crate::snapshot::{PlayerId, Position, Roster, StatsSnapshot};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Formation {
    pub goalkeepers: u8,
    pub defenders: u8,
    pub midfielders: u8,
    pub forwards: u8,
}

impl Formation {
    pub fn from_positions(positions: impl IntoIterator<Item = Position>) -> Self {
        let mut formation = Formation::default();
        for position in positions {
            *formation.slot(position) += 1;
        }
        formation
    }

    pub fn is_valid(&self) -> bool {
        self.goalkeepers == 1
            && (3..=5).contains(&self.defenders)
            && (2..=5).contains(&self.midfielders)
            && (1..=3).contains(&self.forwards)
    }

    pub fn after_swap(&self, outgoing: Position, incoming: Position) -> Formation {
        let mut next = *self;
        let out = next.slot(outgoing);
        *out = out.saturating_sub(1);
        *next.slot(incoming) += 1;
        next
    }

    fn slot(&mut self, position: Position) -> &mut u8 {
        match position {
            Position::Goalkeeper => &mut self.goalkeepers,
            Position::Defender => &mut self.defenders,
            Position::Midfielder => &mut self.midfielders,
            Position::Forward => &mut self.forwards,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Substitution {
    pub outgoing: PlayerId,
    pub incoming: PlayerId,
    pub points: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubstitutionReport {
    pub points: i32,
    pub substitutions: Vec<Substitution>,
    /// Bench players held back because their own team has not finished.
    pub reserved: Vec<PlayerId>,
    pub formation: Formation,
}

impl SubstitutionReport {
    pub fn points_for(&self, incoming: PlayerId) -> Option<i32> {
        self.substitutions
            .iter()
            .find(|s| s.incoming == incoming)
            .map(|s| s.points)
    }
}

/// Replay the automatic substitutions the game would make for this roster.
///
/// Starters are walked in roster order and the bench in priority order. A bench player who has
/// not played yet but still has a fixture to come is reserved for the first starter that reaches
/// the candidate, which ends the search for that starter.
pub fn simulate<F>(roster: &Roster, snapshot: &StatsSnapshot, points: F) -> SubstitutionReport
where
    F: Fn(PlayerId) -> i32,
{
    let starters = roster.starters();
    let bench = roster.bench();

    let mut formation =
        Formation::from_positions(starters.iter().filter_map(|p| snapshot.position(p.element)));
    let mut used: HashSet<PlayerId> = HashSet::new();
    let mut report = SubstitutionReport::default();

    for starter in starters {
        if snapshot.minutes(starter.element) > 0 || !snapshot.player_team_done(starter.element) {
            continue;
        }
        let Some(outgoing) = snapshot.position(starter.element) else {
            continue;
        };

        for candidate in bench {
            if used.contains(&candidate.element) {
                continue;
            }
            let Some(incoming) = snapshot.position(candidate.element) else {
                continue;
            };
            if (outgoing == Position::Goalkeeper) != (incoming == Position::Goalkeeper) {
                continue;
            }

            if snapshot.minutes(candidate.element) == 0 {
                if !snapshot.player_team_done(candidate.element) {
                    used.insert(candidate.element);
                    report.reserved.push(candidate.element);
                    break;
                }
                continue;
            }

            let next = formation.after_swap(outgoing, incoming);
            if !next.is_valid() {
                continue;
            }

            let gained = points(candidate.element);
            used.insert(candidate.element);
            formation = next;
            report.points += gained;
            report.substitutions.push(Substitution {
                outgoing: starter.element,
                incoming: candidate.element,
                points: gained,
            });
            break;
        }
    }

    report.formation = formation;
    report
}
