//! # Server Configuration
//!
//! Router assembly, shared state, and the HTTP listener for the Tournaments API.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, put},
};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::identity_middleware;
use crate::config::AppConfig;
use crate::handlers;
use crate::store::SeaOrmStore;
use crate::telemetry::trace_id_middleware;
use crate::tournament_service::TournamentService;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub tournaments: TournamentService,
}

impl AppState {
    /// Wires the SeaORM-backed store into the tournament service.
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Self {
        let store = Arc::new(SeaOrmStore::new(Arc::new(db.clone())));
        let tournaments = TournamentService::from_config(store, &config);
        Self {
            config: Arc::new(config),
            db,
            tournaments,
        }
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    let api = Router::new()
        .route(
            "/api/tournaments",
            put(handlers::tournaments::create_tournament)
                .post(handlers::tournaments::create_tournament)
                .get(handlers::tournaments::list_tournaments),
        )
        .route(
            "/api/tournaments/{id}",
            get(handlers::tournaments::get_tournament),
        )
        .route(
            "/api/users/me/tournaments",
            get(handlers::users::my_tournaments),
        );

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(api)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(trace_id_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(config, identity_middleware)),
        )
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let app = create_app(AppState::new(config, db));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::tournaments::create_tournament,
        crate::handlers::tournaments::list_tournaments,
        crate::handlers::tournaments::get_tournament,
        crate::handlers::users::my_tournaments,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::domain::Tournament,
            crate::domain::Team,
            crate::validation::CreateTournamentRequest,
            crate::validation::TeamPayload,
            crate::handlers::types::CreateTournamentResponse,
            crate::handlers::types::TournamentListResponse,
            crate::handlers::types::UserTournamentsResponse,
            crate::handlers::types::HealthResponse,
        )
    ),
    modifiers(&BearerAuth),
    info(
        title = "Tournaments API",
        description = "Create and browse tournaments and their teams",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
