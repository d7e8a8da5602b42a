//! # Common API Types
//!
//! Response bodies shared by the tournament and user handlers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Tournament, TournamentId};

/// Body returned after a tournament is created
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTournamentResponse {
    /// Identifier assigned by the store
    pub id: TournamentId,
}

/// One page of the tournament catalog
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TournamentListResponse {
    /// Tournaments on this page, newest first
    pub tournaments: Vec<Tournament>,
    /// `ceil(total / limit)`; 0 for an empty catalog
    #[schema(example = 3)]
    pub total_pages: u64,
}

/// The caller's own tournaments
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserTournamentsResponse {
    /// Most recently created first
    pub tournaments: Vec<Tournament>,
}

/// Liveness payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
}
