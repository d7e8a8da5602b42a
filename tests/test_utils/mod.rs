//! Test utilities for database testing.
//!
//! In-memory SQLite databases with migrations applied, a router wired to
//! them, and helpers for seeding tournaments.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tournaments::{
    config::{AppConfig, SessionToken},
    domain::{NewTournament, Team, Tournament, UserId},
    repositories::TournamentRepository,
    server::{AppState, create_app},
};

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// Every pooled connection to `sqlite::memory:` is its own database, so the
/// pool is pinned to a single connection.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Same as [`setup_test_db`], wrapped for repositories and stores.
#[allow(dead_code)]
pub async fn setup_test_db_arc() -> Result<Arc<DatabaseConnection>> {
    Ok(Arc::new(setup_test_db().await?))
}

/// Sessions accepted by [`test_config`].
#[allow(dead_code)]
pub const ALICE_TOKEN: &str = "alice-session";
#[allow(dead_code)]
pub const BOB_TOKEN: &str = "bob-session";

#[allow(dead_code)]
pub fn test_config() -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        session_tokens: vec![
            SessionToken {
                token: ALICE_TOKEN.to_string(),
                user_id: "alice".to_string(),
            },
            SessionToken {
                token: BOB_TOKEN.to_string(),
                user_id: "bob".to_string(),
            },
        ],
        ..Default::default()
    }
}

/// Full router over a fresh database. The connection is returned for seeding.
#[allow(dead_code)]
pub async fn test_app() -> Result<(axum::Router, DatabaseConnection)> {
    let db = setup_test_db().await?;
    let app = create_app(AppState::new(test_config(), db.clone()));
    Ok((app, db))
}

#[allow(dead_code)]
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

#[allow(dead_code)]
pub fn two_teams() -> Vec<Team> {
    vec![
        Team {
            name: "Red".to_string(),
            color: "#f00".to_string(),
        },
        Team {
            name: "Blue".to_string(),
            color: "#00f".to_string(),
        },
    ]
}

/// Inserts a tournament created `minutes` after [`base_time`], bypassing the
/// owner index.
#[allow(dead_code)]
pub async fn seed_tournament(
    db: &DatabaseConnection,
    name: &str,
    owner: &str,
    minutes: i64,
) -> Result<Tournament> {
    let repo = TournamentRepository::new(Arc::new(db.clone()));
    Ok(repo
        .insert(NewTournament {
            name: name.to_string(),
            teams: two_teams(),
            created_by: UserId::new(owner),
            created_at: base_time() + Duration::minutes(minutes),
        })
        .await?)
}
