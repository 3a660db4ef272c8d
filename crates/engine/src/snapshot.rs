use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub type PlayerId = i64;
pub type TeamId = i64;
pub type EntryId = i64;
pub type FixtureId = i64;
pub type Gameweek = i32;

/// Number of picks that start; the rest is the bench in priority order.
pub const STARTERS: usize = 11;
pub const SQUAD_SIZE: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    pub fn from_element_type(element_type: i64) -> Option<Self> {
        match element_type {
            1 => Some(Position::Goalkeeper),
            2 => Some(Position::Defender),
            3 => Some(Position::Midfielder),
            4 => Some(Position::Forward),
            _ => None,
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GKP",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub web_name: String,
    pub team: TeamId,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureState {
    Pending,
    Started,
    FinishedProvisional,
    Finished,
    /// No kickoff scheduled for this period.
    Postponed,
}

impl FixtureState {
    /// Whether the fixture can no longer change anyone's minutes.
    pub fn is_done(&self) -> bool {
        matches!(
            self,
            FixtureState::FinishedProvisional | FixtureState::Finished | FixtureState::Postponed
        )
    }

    pub fn has_started(&self) -> bool {
        matches!(
            self,
            FixtureState::Started | FixtureState::FinishedProvisional | FixtureState::Finished
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: FixtureId,
    pub home_team: TeamId,
    pub away_team: TeamId,
    pub state: FixtureState,
    /// Bonus point system scores of both sides, as reported for the fixture.
    pub bps: Vec<(PlayerId, i32)>,
}

impl Fixture {
    pub fn involves(&self, team: TeamId) -> bool {
        self.home_team == team || self.away_team == team
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivePlayerStat {
    pub points: i32,
    pub minutes: i32,
    pub bonus: i32,
    pub bps: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chip {
    #[default]
    None,
    Wildcard,
    FreeHit,
    BenchBoost,
    TripleCaptain,
    Other(String),
}

impl Chip {
    pub fn from_api(name: Option<&str>) -> Self {
        match name {
            None | Some("") => Chip::None,
            Some("wildcard") => Chip::Wildcard,
            Some("freehit") => Chip::FreeHit,
            Some("bboost") => Chip::BenchBoost,
            Some("3xc") => Chip::TripleCaptain,
            Some(other) => Chip::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Chip::None => "",
            Chip::Wildcard => "WC",
            Chip::FreeHit => "FH",
            Chip::BenchBoost => "BB",
            Chip::TripleCaptain => "TC",
            Chip::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pick {
    pub element: PlayerId,
    pub is_captain: bool,
    pub is_vice_captain: bool,
}

/// A manager's 15 picks for one gameweek plus what the provider reports about them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub entry: EntryId,
    pub gameweek: Gameweek,
    pub picks: Vec<Pick>,
    pub chip: Chip,
    pub transfer_cost: i32,
    /// Gameweek points as last published by the provider.
    pub provider_points: i32,
    pub provider_total: i32,
}

impl Roster {
    pub fn starters(&self) -> &[Pick] {
        &self.picks[..self.picks.len().min(STARTERS)]
    }

    pub fn bench(&self) -> &[Pick] {
        &self.picks[self.picks.len().min(STARTERS)..]
    }
}

/// Everything known about one gameweek at a point in time.
#[derive(Debug, Clone, Default)]
pub struct StatsSnapshot {
    pub gameweek: Gameweek,
    pub players: HashMap<PlayerId, Player>,
    pub fixtures: Vec<Fixture>,
    pub live: HashMap<PlayerId, LivePlayerStat>,
}

impl StatsSnapshot {
    pub fn new(
        gameweek: Gameweek,
        players: HashMap<PlayerId, Player>,
        fixtures: Vec<Fixture>,
        live: HashMap<PlayerId, LivePlayerStat>,
    ) -> Self {
        Self {
            gameweek,
            players,
            fixtures,
            live,
        }
    }

    /// Missing stats read as a zero line.
    pub fn stat(&self, player: PlayerId) -> LivePlayerStat {
        self.live.get(&player).copied().unwrap_or_default()
    }

    pub fn minutes(&self, player: PlayerId) -> i32 {
        self.stat(player).minutes
    }

    pub fn player(&self, player: PlayerId) -> Option<&Player> {
        self.players.get(&player)
    }

    pub fn position(&self, player: PlayerId) -> Option<Position> {
        self.players.get(&player).map(|p| p.position)
    }

    pub fn web_name(&self, player: PlayerId) -> Option<&str> {
        self.players.get(&player).map(|p| p.web_name.as_str())
    }

    /// True when every fixture of the team is done; a team without a fixture is done.
    pub fn team_done(&self, team: TeamId) -> bool {
        self.fixtures
            .iter()
            .filter(|f| f.involves(team))
            .all(|f| f.state.is_done())
    }

    /// Unknown players are never considered done.
    pub fn player_team_done(&self, player: PlayerId) -> bool {
        self.players
            .get(&player)
            .is_some_and(|p| self.team_done(p.team))
    }

    pub fn is_live(&self) -> bool {
        self.fixtures
            .iter()
            .any(|f| f.state == FixtureState::Started)
    }

    /// Every fixture carries the provider's final confirmation.
    pub fn all_finished(&self) -> bool {
        !self.fixtures.is_empty()
            && self
                .fixtures
                .iter()
                .all(|f| matches!(f.state, FixtureState::Finished | FixtureState::Postponed))
    }
}
