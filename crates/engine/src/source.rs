use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::snapshot::{EntryId, Gameweek, Roster, StatsSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStatus {
    pub gameweek: Gameweek,
    pub is_current: bool,
    pub finished: bool,
}

/// One row of a classic league's cumulative ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassicStanding {
    pub entry: EntryId,
    pub player_name: String,
    pub entry_name: String,
    pub rank: i32,
    pub last_rank: Option<i32>,
    pub total: i32,
    pub event_total: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueEntry {
    pub entry: EntryId,
    pub player_name: String,
    pub entry_name: String,
}

/// A scheduled head-to-head pairing; a side is `None` for a bye.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct H2hPairing {
    pub entry_1: Option<EntryId>,
    pub entry_2: Option<EntryId>,
}

/// Read access to the fantasy game's published data.
///
/// Implementations own retries and timeouts; an error here means the data could not be
/// obtained at all.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn events(&self) -> Result<Vec<EventStatus>, SourceError>;

    async fn snapshot(&self, gameweek: Gameweek) -> Result<StatsSnapshot, SourceError>;

    /// `Ok(None)` when the entry has no picks for the gameweek.
    async fn roster(&self, entry: EntryId, gameweek: Gameweek)
    -> Result<Option<Roster>, SourceError>;

    async fn classic_standings(&self, league_id: i64) -> Result<Vec<ClassicStanding>, SourceError>;

    async fn h2h_entries(&self, league_id: i64) -> Result<Vec<LeagueEntry>, SourceError>;

    async fn h2h_pairings(
        &self,
        league_id: i64,
        gameweek: Gameweek,
    ) -> Result<Vec<H2hPairing>, SourceError>;
}

/// The gameweek flagged current, else the latest finished one.
pub fn current_gameweek(events: &[EventStatus]) -> Option<Gameweek> {
    events
        .iter()
        .find(|e| e.is_current)
        .or_else(|| events.iter().filter(|e| e.finished).max_by_key(|e| e.gameweek))
        .map(|e| e.gameweek)
}

pub fn is_finished(events: &[EventStatus], gameweek: Gameweek) -> bool {
    events
        .iter()
        .any(|e| e.gameweek == gameweek && e.finished)
}

pub type RosterResults = HashMap<EntryId, Result<Option<Roster>, SourceError>>;

/// Fetch many rosters with at most `concurrency` requests in flight.
pub async fn fetch_rosters<S>(
    source: &S,
    entries: &[EntryId],
    gameweek: Gameweek,
    concurrency: usize,
) -> RosterResults
where
    S: StatsSource + ?Sized,
{
    stream::iter(entries.iter().copied())
        .map(|entry| async move { (entry, source.roster(entry, gameweek).await) })
        .buffer_unordered(concurrency.max(1))
        .collect::<RosterResults>()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(gameweek: Gameweek, is_current: bool, finished: bool) -> EventStatus {
        EventStatus {
            gameweek,
            is_current,
            finished,
        }
    }

    #[test]
    fn test_current_gameweek_prefers_flag() {
        let events = vec![event(1, false, true), event(2, true, false), event(3, false, false)];
        assert_eq!(current_gameweek(&events), Some(2));
    }

    #[test]
    fn test_current_gameweek_falls_back_to_latest_finished() {
        let events = vec![event(1, false, true), event(2, false, true), event(3, false, false)];
        assert_eq!(current_gameweek(&events), Some(2));
        assert_eq!(current_gameweek(&[]), None);
    }

    #[test]
    fn test_is_finished() {
        let events = vec![event(1, false, true), event(2, true, false)];
        assert!(is_finished(&events, 1));
        assert!(!is_finished(&events, 2));
        assert!(!is_finished(&events, 9));
    }
}
