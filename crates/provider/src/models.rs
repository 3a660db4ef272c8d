//! Wire shapes of the provider's JSON endpoints. Only the fields we read are declared.

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Bootstrap {
    pub events: Vec<EventData>,
    pub elements: Vec<ElementData>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EventData {
    pub id: i32,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub finished: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ElementData {
    pub id: i64,
    pub web_name: String,
    pub team: i64,
    pub element_type: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FixtureData {
    pub id: i64,
    pub team_h: i64,
    pub team_a: i64,
    #[serde(default)]
    pub started: Option<bool>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub finished_provisional: bool,
    #[serde(default)]
    pub kickoff_time: Option<String>,
    #[serde(default)]
    pub stats: Vec<FixtureStat>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FixtureStat {
    pub identifier: String,
    #[serde(default)]
    pub h: Vec<StatValue>,
    #[serde(default)]
    pub a: Vec<StatValue>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct StatValue {
    pub element: i64,
    pub value: i32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LiveEvent {
    pub elements: Vec<LiveElement>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LiveElement {
    pub id: i64,
    pub stats: LiveStats,
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(default)]
pub struct LiveStats {
    pub minutes: i32,
    pub total_points: i32,
    pub bonus: i32,
    pub bps: i32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EntryPicks {
    #[serde(default)]
    pub active_chip: Option<String>,
    pub entry_history: EntryHistory,
    pub picks: Vec<PickData>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct EntryHistory {
    #[serde(default)]
    pub points: i32,
    #[serde(default)]
    pub total_points: i32,
    #[serde(default)]
    pub event_transfers_cost: i32,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct PickData {
    pub element: i64,
    pub position: i32,
    #[serde(default)]
    pub is_captain: bool,
    #[serde(default)]
    pub is_vice_captain: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Page<T> {
    #[serde(default)]
    pub has_next: bool,
    pub results: Vec<T>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassicLeagueResponse {
    pub standings: Page<ClassicRow>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassicRow {
    pub entry: i64,
    pub player_name: String,
    pub entry_name: String,
    pub rank: i32,
    #[serde(default)]
    pub last_rank: Option<i32>,
    pub total: i32,
    #[serde(default)]
    pub event_total: i32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct H2hLeagueResponse {
    pub standings: Page<H2hRow>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct H2hRow {
    pub entry: i64,
    pub player_name: String,
    pub entry_name: String,
}

/// Matches are paged at the top level, not under `standings`.
pub type H2hMatchesResponse = Page<H2hMatchRow>;

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct H2hMatchRow {
    #[serde(default)]
    pub entry_1_entry: Option<i64>,
    #[serde(default)]
    pub entry_2_entry: Option<i64>,
}
