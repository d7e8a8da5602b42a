//! # User API Handlers

use axum::{extract::State, response::Json};

use crate::auth::RequireSession;
use crate::error::ApiError;
use crate::handlers::types::UserTournamentsResponse;
use crate::server::AppState;

/// The caller's own tournaments, most recent first
#[utoipa::path(
    get,
    path = "/api/users/me/tournaments",
    responses(
        (status = 200, description = "Tournaments owned by the caller", body = UserTournamentsResponse),
        (status = 401, description = "No session", body = ApiError),
        (status = 500, description = "Store failure", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn my_tournaments(
    State(state): State<AppState>,
    RequireSession(identity): RequireSession,
) -> Result<Json<UserTournamentsResponse>, ApiError> {
    let tournaments = state.tournaments.list_for_user(&identity).await?;
    Ok(Json(UserTournamentsResponse { tournaments }))
}
