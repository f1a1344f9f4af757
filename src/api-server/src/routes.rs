//! Route definitions for the API server
//!
//! Each route carries its declared permission requirement; the guard
//! layer runs the authorization pipeline before the handler. Building
//! the router fails on a malformed requirement string, which is a
//! deployment misconfiguration and should halt startup.

use crate::{handlers, middleware, middleware::RouteGuard, state::AppState};
use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::str::FromStr;
use tower_http::trace::TraceLayer;
use wavemap_auth::{
    pipeline::RouteRequirement,
    scope::{ScopeGrant, ScopeResult},
};

fn requires(scopes: &[&str]) -> ScopeResult<RouteRequirement> {
    let required = scopes
        .iter()
        .map(|s| ScopeGrant::from_str(s))
        .collect::<ScopeResult<Vec<_>>>()?;
    Ok(RouteRequirement::new(required, false))
}

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState) -> ScopeResult<Router> {
    let guest_token_routes = Router::new()
        .route("/v1/guest-tokens", post(handlers::issue_guest_token))
        .route_layer(axum_middleware::from_fn_with_state(
            RouteGuard::new(state.clone(), RouteRequirement::open()),
            middleware::authorize_request,
        ));

    // Any valid credential, no particular scopes.
    let introspection_routes = Router::new()
        .route("/v1/me", get(handlers::me))
        .route_layer(axum_middleware::from_fn_with_state(
            RouteGuard::new(state.clone(), RouteRequirement::new(Vec::new(), false)),
            middleware::authorize_request,
        ));

    let issue_routes = Router::new()
        .route("/v1/tokens", post(handlers::issue_token))
        .route_layer(axum_middleware::from_fn_with_state(
            RouteGuard::new(state.clone(), requires(&["issue:tokens"])?),
            middleware::authorize_request,
        ));

    let revoke_routes = Router::new()
        .route("/v1/tokens/:id", delete(handlers::revoke_token))
        .route_layer(axum_middleware::from_fn_with_state(
            RouteGuard::new(state.clone(), requires(&["revoke:tokens"])?),
            middleware::authorize_request,
        ));

    let router = Router::new()
        // Health endpoint (no auth required)
        .route("/health", get(handlers::health))
        .merge(guest_token_routes)
        .merge(introspection_routes)
        .merge(issue_routes)
        .merge(revoke_routes)
        .with_state(state)
        // Middleware layers (executed bottom to top)
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(middleware::cors_layer())
        .layer(TraceLayer::new_for_http());

    Ok(router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn test_app() -> Router {
        create_router(AppState::in_memory().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint_is_open() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_me_requires_credential() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/v1/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_guest_tokens_are_open() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/guest-tokens")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_token_issue_requires_credential() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/tokens")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"tier":"basic","scopes":["read:stations"]}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
