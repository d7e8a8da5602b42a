//! # Data Models
//!
//! SeaORM entities backing the tournament catalog, plus the service info
//! payload returned from the root endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod tournament;
pub mod user;

pub use tournament::Entity as TournamentEntity;
pub use user::Entity as UserEntity;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "tournaments-api".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
