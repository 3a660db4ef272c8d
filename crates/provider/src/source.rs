use async_trait::async_trait;
use engine::SourceError;
use engine::snapshot::{EntryId, Gameweek, Roster, StatsSnapshot};
use engine::source::{ClassicStanding, EventStatus, H2hPairing, LeagueEntry, StatsSource};
use tracing::debug;

use crate::client::FplClient;
use crate::error::Result;
use crate::transformer;

/// Upper bound on pages walked for one league, in case `has_next` never clears.
const MAX_PAGES: u32 = 200;

pub struct FplSource {
    client: FplClient,
}

impl FplSource {
    pub fn new(client: FplClient) -> Self {
        Self { client }
    }

    async fn fetch_snapshot(&self, gameweek: Gameweek) -> Result<StatsSnapshot> {
        let (bootstrap, fixtures, live) = tokio::try_join!(
            self.client.bootstrap(),
            self.client.fixtures(gameweek),
            self.client.live(gameweek),
        )?;

        debug!(
            gameweek,
            fixtures = fixtures.len(),
            players = live.elements.len(),
            "Fetched gameweek snapshot"
        );

        Ok(transformer::snapshot(gameweek, &bootstrap, &fixtures, &live))
    }

    async fn fetch_classic(&self, league_id: i64) -> Result<Vec<ClassicStanding>> {
        let mut rows = Vec::new();
        for page in 1..=MAX_PAGES {
            let response = self.client.classic_standings_page(league_id, page).await?;
            rows.extend(response.standings.results.iter().map(transformer::classic_standing));
            if !response.standings.has_next {
                break;
            }
        }
        Ok(rows)
    }

    async fn fetch_h2h_entries(&self, league_id: i64) -> Result<Vec<LeagueEntry>> {
        let mut rows = Vec::new();
        for page in 1..=MAX_PAGES {
            let response = self.client.h2h_standings_page(league_id, page).await?;
            rows.extend(response.standings.results.iter().map(transformer::league_entry));
            if !response.standings.has_next {
                break;
            }
        }
        Ok(rows)
    }

    async fn fetch_pairings(&self, league_id: i64, gameweek: Gameweek) -> Result<Vec<H2hPairing>> {
        let mut pairings = Vec::new();
        for page in 1..=MAX_PAGES {
            let response = self.client.h2h_matches_page(league_id, gameweek, page).await?;
            pairings.extend(response.results.iter().map(transformer::pairing));
            if !response.has_next {
                break;
            }
        }
        Ok(pairings)
    }
}

#[async_trait]
impl StatsSource for FplSource {
    async fn events(&self) -> std::result::Result<Vec<EventStatus>, SourceError> {
        let bootstrap = self.client.bootstrap().await?;
        Ok(transformer::events(&bootstrap))
    }

    async fn snapshot(&self, gameweek: Gameweek) -> std::result::Result<StatsSnapshot, SourceError> {
        Ok(self.fetch_snapshot(gameweek).await?)
    }

    async fn roster(
        &self,
        entry: EntryId,
        gameweek: Gameweek,
    ) -> std::result::Result<Option<Roster>, SourceError> {
        let picks = self.client.picks(entry, gameweek).await?;
        Ok(picks.map(|p| transformer::roster(entry, gameweek, &p)))
    }

    async fn classic_standings(
        &self,
        league_id: i64,
    ) -> std::result::Result<Vec<ClassicStanding>, SourceError> {
        Ok(self.fetch_classic(league_id).await?)
    }

    async fn h2h_entries(&self, league_id: i64) -> std::result::Result<Vec<LeagueEntry>, SourceError> {
        Ok(self.fetch_h2h_entries(league_id).await?)
    }

    async fn h2h_pairings(
        &self,
        league_id: i64,
        gameweek: Gameweek,
    ) -> std::result::Result<Vec<H2hPairing>, SourceError> {
        Ok(self.fetch_pairings(league_id, gameweek).await?)
    }
}
