//! # Tournaments API Library
//!
//! Tournament creation and browsing: validation, the owner index kept in step
//! with each create, paginated listing, and the HTTP surface over them.

pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pagination;
pub mod reconcile;
pub mod repositories;
pub mod server;
pub mod store;
pub mod telemetry;
pub mod tournament_service;
pub mod validation;
pub use migration;
