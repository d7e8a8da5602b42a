//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM operations
//! for the tournament catalog and the per-user tournament index.

pub mod tournament;
pub mod user;

pub use tournament::TournamentRepository;
pub use user::UserIndexRepository;
