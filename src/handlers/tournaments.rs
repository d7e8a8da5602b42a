//! # Tournament API Handlers
//!
//! Create, list and fetch tournaments.

use axum::{
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, HeaderValue, StatusCode, header::LOCATION},
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::auth::RequireSession;
use crate::domain::{Tournament, TournamentId};
use crate::error::{ApiError, validation_error};
use crate::handlers::types::{CreateTournamentResponse, TournamentListResponse};
use crate::server::AppState;
use crate::validation::CreateTournamentRequest;

/// Query parameters for the tournament catalog
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListTournamentsQuery {
    /// 1-based page number (default: 1)
    pub page: Option<i64>,
    /// Page size (default: 9, max: 100)
    pub limit: Option<i64>,
}

/// Create a tournament owned by the caller. Also routed for `POST`.
#[utoipa::path(
    put,
    path = "/api/tournaments",
    request_body = CreateTournamentRequest,
    responses(
        (status = 201, description = "Tournament created", body = CreateTournamentResponse,
            headers(("Location" = String, description = "URL of the new tournament"))),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "No session", body = ApiError),
        (status = 500, description = "Store failure", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "tournaments"
)]
pub async fn create_tournament(
    State(state): State<AppState>,
    RequireSession(identity): RequireSession,
    payload: Result<Json<CreateTournamentRequest>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<CreateTournamentResponse>), ApiError> {
    let Json(request) = payload?;
    let id = state.tournaments.create(&identity, request).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/tournaments/{id}")) {
        headers.insert(LOCATION, location);
    }

    Ok((StatusCode::CREATED, headers, Json(CreateTournamentResponse { id })))
}

/// List tournaments, newest first
#[utoipa::path(
    get,
    path = "/api/tournaments",
    params(ListTournamentsQuery),
    responses(
        (status = 200, description = "One page of tournaments", body = TournamentListResponse),
        (status = 400, description = "Invalid page or limit", body = ApiError),
        (status = 500, description = "Store failure", body = ApiError)
    ),
    tag = "tournaments"
)]
pub async fn list_tournaments(
    State(state): State<AppState>,
    query: Result<Query<ListTournamentsQuery>, QueryRejection>,
) -> Result<Json<TournamentListResponse>, ApiError> {
    let Query(query) = query?;
    let page = state.tournaments.page_request(query.page, query.limit)?;
    let page = state.tournaments.list(page).await?;

    Ok(Json(TournamentListResponse {
        tournaments: page.tournaments,
        total_pages: page.total_pages,
    }))
}

/// Fetch a single tournament
#[utoipa::path(
    get,
    path = "/api/tournaments/{id}",
    params(("id" = String, Path, description = "Tournament id")),
    responses(
        (status = 200, description = "The tournament", body = Tournament),
        (status = 400, description = "Malformed id", body = ApiError),
        (status = 404, description = "No such tournament", body = ApiError)
    ),
    tag = "tournaments"
)]
pub async fn get_tournament(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Tournament>, ApiError> {
    let id: TournamentId = id.parse().map_err(|_| {
        validation_error(
            "Tournament id must be a UUID",
            serde_json::json!({ "field": "id", "reason": "InvalidId" }),
        )
    })?;

    Ok(Json(state.tournaments.get(id).await?))
}
