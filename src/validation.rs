//! # Tournament Validation
//!
//! Structural checks applied to a create payload before anything is written.
//! Rules run in a fixed order and the first failure is reported.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::domain::Team;

/// Team entry as received on the wire; every field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TeamPayload {
    #[schema(example = "Red Rockets")]
    pub name: Option<String>,
    #[schema(example = "#ff0000")]
    pub color: Option<String>,
}

/// Request payload for creating a tournament
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTournamentRequest {
    /// Tournament name (required, non-empty)
    #[schema(example = "Summer Cup")]
    pub name: Option<String>,
    /// Participating teams (at least two). A `null` entry counts as a team
    /// with neither name nor color.
    pub teams: Option<Vec<Option<TeamPayload>>>,
    /// Declared owner. Ignored in favour of the authenticated user.
    pub created_by: Option<String>,
}

/// Reasons a create payload is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name of tournament is required")]
    MissingName,
    #[error("Insufficient teams: at least 2 teams are required")]
    InsufficientTeams,
    #[error("Name of a team is required (team {index})")]
    MissingTeamName { index: usize },
    #[error("Color of a team is required (team {index})")]
    MissingTeamColor { index: usize },
}

impl ValidationError {
    /// Stable rule name, surfaced to clients in error details.
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::MissingName => "MissingName",
            ValidationError::InsufficientTeams => "InsufficientTeams",
            ValidationError::MissingTeamName { .. } => "MissingTeamName",
            ValidationError::MissingTeamColor { .. } => "MissingTeamColor",
        }
    }

    /// Path of the offending field within the payload.
    pub fn field(&self) -> String {
        match self {
            ValidationError::MissingName => "name".to_string(),
            ValidationError::InsufficientTeams => "teams".to_string(),
            ValidationError::MissingTeamName { index } => format!("teams[{index}].name"),
            ValidationError::MissingTeamColor { index } => format!("teams[{index}].color"),
        }
    }
}

/// Payload that passed every rule, with surrounding whitespace removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTournament {
    pub name: String,
    pub teams: Vec<Team>,
}

/// Minimum number of teams a tournament needs.
pub const MIN_TEAMS: usize = 2;

pub fn validate(request: &CreateTournamentRequest) -> Result<ValidatedTournament, ValidationError> {
    let name = non_empty(request.name.as_deref()).ok_or(ValidationError::MissingName)?;

    let teams = request.teams.as_deref().unwrap_or_default();
    if teams.len() < MIN_TEAMS {
        return Err(ValidationError::InsufficientTeams);
    }

    let teams = teams
        .iter()
        .enumerate()
        .map(|(index, team)| {
            let name = non_empty(team.as_ref().and_then(|t| t.name.as_deref()))
                .ok_or(ValidationError::MissingTeamName { index })?;
            let color = non_empty(team.as_ref().and_then(|t| t.color.as_deref()))
                .ok_or(ValidationError::MissingTeamColor { index })?;
            Ok(Team {
                name: name.to_string(),
                color: color.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ValidatedTournament {
        name: name.to_string(),
        teams,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
