use std::collections::HashMap;

use tracing::{debug, warn};

use crate::bonus::{self, BonusTable};
use crate::error::SourceError;
use crate::scoring::{LiveScore, LiveScoringCalculator};
use crate::snapshot::{EntryId, Gameweek, Roster, StatsSnapshot};
use crate::source::{self, StatsSource};

/// A gameweek snapshot together with its projected bonus.
#[derive(Debug, Clone)]
pub struct GameweekData {
    pub snapshot: StatsSnapshot,
    pub bonus: BonusTable,
}

impl GameweekData {
    pub fn from_snapshot(snapshot: StatsSnapshot) -> Self {
        let bonus = bonus::project(&snapshot);
        Self { snapshot, bonus }
    }

    pub async fn load<S>(source: &S, gameweek: Gameweek) -> Result<Self, SourceError>
    where
        S: StatsSource + ?Sized,
    {
        let snapshot = source.snapshot(gameweek).await?;
        debug!(
            gameweek,
            fixtures = snapshot.fixtures.len(),
            players = snapshot.players.len(),
            "Loaded gameweek snapshot"
        );
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn gameweek(&self) -> Gameweek {
        self.snapshot.gameweek
    }
}

#[derive(Debug, Clone)]
pub enum EntryOutcome {
    Scored { roster: Roster, score: LiveScore },
    NoPicks,
    Unavailable(SourceError),
}

impl EntryOutcome {
    /// Missing picks count as zero; an unavailable roster has no score.
    pub fn points(&self) -> Option<i32> {
        match self {
            EntryOutcome::Scored { score, .. } => Some(score.points),
            EntryOutcome::NoPicks => Some(0),
            EntryOutcome::Unavailable(_) => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, EntryOutcome::Unavailable(_))
    }
}

/// Fetch and score every entry for one gameweek.
pub async fn score_entries<S>(
    source: &S,
    data: &GameweekData,
    calculator: &LiveScoringCalculator,
    entries: &[EntryId],
    concurrency: usize,
) -> HashMap<EntryId, EntryOutcome>
where
    S: StatsSource + ?Sized,
{
    let rosters = source::fetch_rosters(source, entries, data.gameweek(), concurrency).await;

    rosters
        .into_iter()
        .map(|(entry, fetched)| {
            let outcome = match fetched {
                Ok(Some(roster)) => {
                    let score = calculator.score(&roster, &data.snapshot, &data.bonus);
                    EntryOutcome::Scored { roster, score }
                }
                Ok(None) => EntryOutcome::NoPicks,
                Err(e) => {
                    warn!(entry, gameweek = data.gameweek(), error = %e, "Roster unavailable");
                    EntryOutcome::Unavailable(e)
                }
            };
            (entry, outcome)
        })
        .collect()
}
