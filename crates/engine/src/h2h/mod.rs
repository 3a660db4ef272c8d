//! Head-to-head results and cumulative league tables.

mod live;

pub use live::{H2hLeague, H2hTable};

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;
use storage::models::{MatchRecord, StandingRecord};

use crate::config::{H2hLeagueConfig, LeagueTeam};
use crate::error::SourceError;
use crate::gameweek::{self, GameweekData};
use crate::scoring::LiveScoringCalculator;
use crate::snapshot::{EntryId, Gameweek};
use crate::source::{H2hPairing, StatsSource};

pub const BYE_OPPONENT: &str = "BYE";
pub const BYE_RESULT: &str = "B";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchOutcome {
    Win,
    Draw,
    Loss,
}

impl MatchOutcome {
    pub fn between(own: i32, other: i32) -> Self {
        match own.cmp(&other) {
            std::cmp::Ordering::Greater => MatchOutcome::Win,
            std::cmp::Ordering::Equal => MatchOutcome::Draw,
            std::cmp::Ordering::Less => MatchOutcome::Loss,
        }
    }

    pub fn league_points(&self) -> i32 {
        match self {
            MatchOutcome::Win => 3,
            MatchOutcome::Draw => 1,
            MatchOutcome::Loss => 0,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            MatchOutcome::Win => "W",
            MatchOutcome::Draw => "D",
            MatchOutcome::Loss => "L",
        }
    }
}

/// Cumulative totals carried into a gameweek.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseTotals {
    league_points: HashMap<i64, i32>,
    fantasy_points: HashMap<i64, i32>,
}

impl BaseTotals {
    pub fn from_standings(rows: &[StandingRecord]) -> Self {
        Self {
            league_points: rows
                .iter()
                .map(|r| (r.participant_id, r.league_points))
                .collect(),
            fantasy_points: rows
                .iter()
                .map(|r| (r.participant_id, r.total_points))
                .collect(),
        }
    }

    pub fn league_points(&self, participant: i64) -> i32 {
        self.league_points.get(&participant).copied().unwrap_or(0)
    }

    pub fn fantasy_points(&self, participant: i64) -> i32 {
        self.fantasy_points.get(&participant).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodResult {
    pub gameweek: Gameweek,
    pub standings: Vec<StandingRecord>,
    pub matches: Vec<MatchRecord>,
}

/// Whether stored rows describe a fully played round for every participant.
pub fn is_complete(rows: &[StandingRecord], participants: usize) -> bool {
    participants > 0
        && rows.len() == participants
        && rows.iter().all(StandingRecord::has_match_details)
        && rows.iter().any(|r| r.league_points != 0)
}

/// Map entry pairings onto participant pairs, ordered low id first and without repeats.
///
/// A participant plays at most once per gameweek; later pairings involving an already matched
/// participant are dropped.
pub fn participant_pairs(teams: &[LeagueTeam], pairings: &[H2hPairing]) -> Vec<(i64, i64)> {
    let team_of: HashMap<EntryId, i64> = teams
        .iter()
        .flat_map(|t| t.entries.iter().map(move |e| (*e, t.id)))
        .collect();

    let mut seen = BTreeSet::new();
    let mut matched = HashSet::new();
    let mut pairs = Vec::new();

    for pairing in pairings {
        let (Some(a), Some(b)) = (pairing.entry_1, pairing.entry_2) else {
            continue;
        };
        let (Some(&team_a), Some(&team_b)) = (team_of.get(&a), team_of.get(&b)) else {
            continue;
        };
        if team_a == team_b {
            continue;
        }
        let pair = (team_a.min(team_b), team_a.max(team_b));
        if !seen.insert(pair) || matched.contains(&pair.0) || matched.contains(&pair.1) {
            continue;
        }
        matched.insert(pair.0);
        matched.insert(pair.1);
        pairs.push(pair);
    }

    pairs
}

/// Build one gameweek's matches and table on top of the previous cumulative totals.
pub fn build_period(
    league_key: &str,
    gameweek: Gameweek,
    teams: &[LeagueTeam],
    team_points: &HashMap<i64, i32>,
    pairings: &[H2hPairing],
    base: &BaseTotals,
) -> PeriodResult {
    let name_of: HashMap<i64, &str> = teams.iter().map(|t| (t.id, t.name.as_str())).collect();
    let points_of = |team: i64| team_points.get(&team).copied().unwrap_or(0);

    let mut matches = Vec::new();
    let mut outcomes: HashMap<i64, (MatchOutcome, String)> = HashMap::new();

    for (p1, p2) in participant_pairs(teams, pairings) {
        let (p1_points, p2_points) = (points_of(p1), points_of(p2));
        let outcome = MatchOutcome::between(p1_points, p2_points);
        let winner = match outcome {
            MatchOutcome::Win => 1,
            MatchOutcome::Loss => 2,
            MatchOutcome::Draw => 0,
        };
        let p1_name = name_of.get(&p1).copied().unwrap_or_default().to_string();
        let p2_name = name_of.get(&p2).copied().unwrap_or_default().to_string();

        outcomes.insert(p1, (outcome, p2_name.clone()));
        outcomes.insert(p2, (MatchOutcome::between(p2_points, p1_points), p1_name.clone()));

        matches.push(MatchRecord {
            league_key: league_key.to_string(),
            gameweek,
            participant_1_id: p1,
            participant_1_name: p1_name,
            participant_1_points: p1_points,
            participant_2_id: p2,
            participant_2_name: p2_name,
            participant_2_points: p2_points,
            winner,
        });
    }

    let mut standings: Vec<StandingRecord> = teams
        .iter()
        .map(|team| {
            let gameweek_points = points_of(team.id);
            let (earned, opponent, result) = match outcomes.get(&team.id) {
                Some((outcome, opponent)) => {
                    (outcome.league_points(), opponent.clone(), outcome.code())
                }
                None => (0, BYE_OPPONENT.to_string(), BYE_RESULT),
            };
            StandingRecord {
                league_key: league_key.to_string(),
                gameweek,
                participant_id: team.id,
                participant_name: team.name.clone(),
                rank: 0,
                league_points: base.league_points(team.id) + earned,
                gameweek_points,
                total_points: base.fantasy_points(team.id) + gameweek_points,
                opponent: Some(opponent),
                result: Some(result.to_string()),
            }
        })
        .collect();

    standings.sort_by(|a, b| {
        b.league_points
            .cmp(&a.league_points)
            .then(b.total_points.cmp(&a.total_points))
            .then(a.participant_id.cmp(&b.participant_id))
    });
    for (idx, row) in standings.iter_mut().enumerate() {
        row.rank = idx as i32 + 1;
    }

    PeriodResult {
        gameweek,
        standings,
        matches,
    }
}

/// Configured teams, or one team per league entry when none are configured.
pub async fn resolve_teams<S>(
    config: &H2hLeagueConfig,
    source: &S,
) -> Result<Vec<LeagueTeam>, SourceError>
where
    S: StatsSource + ?Sized,
{
    if !config.teams.is_empty() {
        return Ok(config.teams.clone());
    }

    let entries = source.h2h_entries(config.h2h_league_id).await?;
    Ok(entries
        .into_iter()
        .map(|e| LeagueTeam {
            id: e.entry,
            name: e.entry_name,
            entries: vec![e.entry],
        })
        .collect())
}

/// Score every member entry for a gameweek and build the period on top of `base`.
///
/// Entries without picks count as zero; any roster that cannot be fetched fails the period.
pub async fn compute_period<S>(
    config: &H2hLeagueConfig,
    teams: &[LeagueTeam],
    source: &S,
    data: &GameweekData,
    base: &BaseTotals,
    concurrency: usize,
) -> Result<PeriodResult, SourceError>
where
    S: StatsSource + ?Sized,
{
    let calculator = LiveScoringCalculator::new(config.rules);
    let entries: Vec<EntryId> = teams.iter().flat_map(|t| t.entries.iter().copied()).collect();

    let outcomes =
        gameweek::score_entries(source, data, &calculator, &entries, concurrency).await;

    let mut entry_points = HashMap::new();
    for (entry, outcome) in outcomes {
        match outcome.points() {
            Some(points) => {
                entry_points.insert(entry, points);
            }
            None => {
                return Err(SourceError::Unavailable(format!(
                    "roster for entry {} in gameweek {}",
                    entry,
                    data.gameweek()
                )));
            }
        }
    }

    let team_points: HashMap<i64, i32> = teams
        .iter()
        .map(|t| {
            let sum: i32 = t
                .entries
                .iter()
                .map(|e| entry_points.get(e).copied().unwrap_or(0))
                .sum();
            (t.id, sum)
        })
        .collect();

    let pairings = source
        .h2h_pairings(config.h2h_league_id, data.gameweek())
        .await?;

    Ok(build_period(
        &config.key,
        data.gameweek(),
        teams,
        &team_points,
        &pairings,
        base,
    ))
}
