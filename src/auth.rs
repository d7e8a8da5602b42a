//! # Session Identity
//!
//! Resolves the caller's session into an explicit [`IdentityContext`] that is
//! passed to every service operation needing a user. Sessions are bearer
//! tokens issued by the identity provider and mapped to user ids in config.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::config::AppConfig;
use crate::domain::UserId;
use crate::error::{ApiError, unauthorized};

/// The authenticated caller, or the absence of one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdentityContext {
    #[default]
    Anonymous,
    Authenticated(UserId),
}

impl IdentityContext {
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            IdentityContext::Anonymous => None,
            IdentityContext::Authenticated(user) => Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id().is_some()
    }
}

/// Attaches an [`IdentityContext`] to every request. Never rejects: missing or
/// unknown tokens resolve to `Anonymous` and each route decides what that means.
pub async fn identity_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = resolve_identity(&config, request.headers());
    if let IdentityContext::Authenticated(user) = &identity {
        tracing::debug!(user_id = %user, "Resolved session");
    }

    request.extensions_mut().insert(identity);
    next.run(request).await
}

fn resolve_identity(config: &AppConfig, headers: &HeaderMap) -> IdentityContext {
    let Some(token) = bearer_token(headers) else {
        return IdentityContext::Anonymous;
    };

    config
        .session_tokens
        .iter()
        .find(|session| bool::from(token.as_bytes().ct_eq(session.token.as_bytes())))
        .map(|session| IdentityContext::Authenticated(UserId::new(session.user_id.clone())))
        .unwrap_or_else(|| {
            tracing::debug!("Bearer token did not match any session");
            IdentityContext::Anonymous
        })
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl<S> FromRequestParts<S> for IdentityContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<IdentityContext>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Extractor for routes that need a session. Rejects with 401 before the
/// request body is read.
#[derive(Debug, Clone)]
pub struct RequireSession(pub IdentityContext);

impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let identity = IdentityContext::from_request_parts(parts, state).await?;
        if identity.is_authenticated() {
            Ok(RequireSession(identity))
        } else {
            Err(unauthorized(Some("A valid session is required")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionToken;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use tower::ServiceExt;

    fn create_test_config() -> Arc<AppConfig> {
        Arc::new(AppConfig {
            session_tokens: vec![SessionToken {
                token: "session-abc".to_string(),
                user_id: "user-1".to_string(),
            }],
            ..Default::default()
        })
    }

    async fn whoami(identity: IdentityContext) -> String {
        identity
            .user_id()
            .map(ToString::to_string)
            .unwrap_or_else(|| "anonymous".to_string())
    }

    async fn protected(RequireSession(identity): RequireSession) -> String {
        whoami(identity).await
    }

    async fn run(request: Request<Body>) -> (StatusCode, String) {
        let config = create_test_config();
        let response = Router::new()
            .route("/whoami", get(whoami))
            .route("/protected", get(protected))
            .layer(axum::middleware::from_fn_with_state(
                Arc::clone(&config),
                identity_middleware,
            ))
            .with_state(config)
            .oneshot(request)
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn known_token_resolves_user() {
        let request = Request::builder()
            .uri("/whoami")
            .header("Authorization", "Bearer session-abc")
            .body(Body::empty())
            .unwrap();

        assert_eq!(run(request).await, (StatusCode::OK, "user-1".to_string()));
    }

    #[tokio::test]
    async fn missing_header_is_anonymous() {
        let request = Request::builder().uri("/whoami").body(Body::empty()).unwrap();
        assert_eq!(run(request).await, (StatusCode::OK, "anonymous".to_string()));
    }

    #[tokio::test]
    async fn unknown_token_and_wrong_scheme_are_anonymous() {
        for header in ["Bearer nope", "Basic session-abc", "Bearer "] {
            let request = Request::builder()
                .uri("/whoami")
                .header("Authorization", header)
                .body(Body::empty())
                .unwrap();
            assert_eq!(run(request).await.1, "anonymous");
        }
    }

    #[tokio::test]
    async fn protected_route_rejects_anonymous() {
        let request = Request::builder()
            .uri("/protected")
            .body(Body::empty())
            .unwrap();
        assert_eq!(run(request).await.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn protected_route_accepts_session() {
        let request = Request::builder()
            .uri("/protected")
            .header("Authorization", "Bearer session-abc")
            .body(Body::empty())
            .unwrap();
        assert_eq!(run(request).await, (StatusCode::OK, "user-1".to_string()));
    }
}
