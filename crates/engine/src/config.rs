use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::{EngineError, Result};
use crate::scoring::ScoringRules;
use crate::snapshot::{EntryId, Gameweek};

fn default_qualification_end() -> Gameweek {
    19
}

fn default_elimination_end() -> Gameweek {
    33
}

fn default_championship_end() -> Gameweek {
    37
}

fn default_qualified_count() -> usize {
    100
}

fn default_elimination_cohort() -> usize {
    6
}

fn default_concurrency() -> usize {
    20
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_phase_boundaries"))]
pub struct TournamentConfig {
    #[validate(length(min = 1, message = "league key must not be empty"))]
    pub key: String,

    #[validate(range(min = 1))]
    pub league_id: i64,

    /// Last gameweek of qualification.
    #[serde(default = "default_qualification_end")]
    #[validate(range(min = 1, max = 38))]
    pub qualification_end: Gameweek,

    #[serde(default = "default_elimination_end")]
    #[validate(range(min = 1, max = 38))]
    pub elimination_end: Gameweek,

    #[serde(default = "default_championship_end")]
    #[validate(range(min = 1, max = 38))]
    pub championship_end: Gameweek,

    #[serde(default = "default_qualified_count")]
    #[validate(range(min = 2))]
    pub qualified_count: usize,

    #[serde(default = "default_elimination_cohort")]
    #[validate(range(min = 1))]
    pub elimination_cohort: usize,

    #[serde(default)]
    pub defending_champion: Option<EntryId>,

    #[serde(default)]
    pub rules: ScoringRules,
}

fn validate_phase_boundaries(config: &TournamentConfig) -> std::result::Result<(), ValidationError> {
    if config.qualification_end >= config.elimination_end
        || config.elimination_end >= config.championship_end
    {
        return Err(ValidationError::new("phase_boundaries"));
    }
    let elimination_periods = (config.elimination_end - config.qualification_end) as usize;
    if elimination_periods * config.elimination_cohort >= config.qualified_count {
        return Err(ValidationError::new("cohort_exceeds_registry"));
    }
    Ok(())
}

/// A participant in a head-to-head league; individual leagues use one entry per team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueTeam {
    pub id: i64,
    pub name: String,
    pub entries: Vec<EntryId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_teams"))]
pub struct H2hLeagueConfig {
    #[validate(length(min = 1, message = "league key must not be empty"))]
    pub key: String,

    #[validate(range(min = 1))]
    pub h2h_league_id: i64,

    /// Gameweek before the league's first match; nothing at or below it is rebuilt.
    #[serde(default)]
    #[validate(range(min = 0, max = 38))]
    pub baseline_gameweek: Gameweek,

    /// Empty means every league entry plays for itself.
    #[serde(default)]
    pub teams: Vec<LeagueTeam>,

    #[serde(default)]
    pub rules: ScoringRules,
}

fn validate_teams(config: &H2hLeagueConfig) -> std::result::Result<(), ValidationError> {
    let mut team_ids = HashSet::new();
    let mut entries = HashSet::new();
    for team in &config.teams {
        if team.entries.is_empty() {
            return Err(ValidationError::new("empty_team"));
        }
        if !team_ids.insert(team.id) {
            return Err(ValidationError::new("duplicate_team"));
        }
        if !team.entries.iter().all(|e| entries.insert(*e)) {
            return Err(ValidationError::new("entry_in_two_teams"));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct FetchConfig {
    #[serde(default = "default_concurrency")]
    #[validate(range(min = 1, max = 64))]
    pub concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

/// Every league this process serves, as read from the leagues file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaguesConfig {
    #[serde(default)]
    pub tournaments: Vec<TournamentConfig>,
    #[serde(default)]
    pub h2h: Vec<H2hLeagueConfig>,
    #[serde(default)]
    pub fetch: FetchConfig,
}

impl LeaguesConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: LeaguesConfig =
            serde_json::from_str(raw).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate_all()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EngineError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate_all(&self) -> Result<()> {
        let invalid = |key: &str, e: validator::ValidationErrors| {
            EngineError::InvalidConfig(format!("league '{}': {}", key, e))
        };

        let mut keys = HashSet::new();
        for league in &self.tournaments {
            league.validate().map_err(|e| invalid(&league.key, e))?;
            if !keys.insert(league.key.as_str()) {
                return Err(EngineError::InvalidConfig(format!(
                    "duplicate league key '{}'",
                    league.key
                )));
            }
        }
        for league in &self.h2h {
            league.validate().map_err(|e| invalid(&league.key, e))?;
            if !keys.insert(league.key.as_str()) {
                return Err(EngineError::InvalidConfig(format!(
                    "duplicate league key '{}'",
                    league.key
                )));
            }
        }
        self.fetch
            .validate()
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        Ok(())
    }

    pub fn tournament(&self, key: &str) -> Option<&TournamentConfig> {
        self.tournaments.iter().find(|t| t.key == key)
    }

    pub fn h2h_league(&self, key: &str) -> Option<&H2hLeagueConfig> {
        self.h2h.iter().find(|l| l.key == key)
    }
}
