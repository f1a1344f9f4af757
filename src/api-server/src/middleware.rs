//! Middleware layer for the API server
//!
//! This module provides middleware components for:
//! - Route authorization through the pipeline (guard layer)
//! - Request logging and tracing
//! - CORS configuration
//! - Request ID tracking

use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use uuid::Uuid;
use wavemap_auth::{pipeline::RouteRequirement, RequestMeta};

use crate::{error::ApiError, state::AppState};

/// Request ID header name
pub const X_REQUEST_ID: &str = "x-request-id";

/// Session cookie name
pub const SESSION_COOKIE: &str = "wavemap_session";

/// Guest token header name
pub const X_GUEST_TOKEN: &str = "x-guest-token";

/// Forwarded client address header
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Per-route guard state: the shared app state plus the route's
/// declared permission requirement
#[derive(Clone)]
pub struct RouteGuard {
    state: AppState,
    requirement: Arc<RouteRequirement>,
}

impl RouteGuard {
    pub fn new(state: AppState, requirement: RouteRequirement) -> Self {
        Self {
            state,
            requirement: Arc::new(requirement),
        }
    }
}

/// Authorization guard middleware
///
/// Runs the full pipeline (credential → rate limit → scopes) and
/// attaches the resulting [`wavemap_auth::AuthContext`] to the request
/// extensions for downstream handlers. Denials short-circuit with the
/// structured body for their gate.
pub async fn authorize_request(
    State(guard): State<RouteGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    let meta = request_meta(&request);

    match guard
        .state
        .pipeline
        .authorize(&meta, &guard.requirement)
        .await
    {
        Ok(context) => {
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// Extracts raw credential material from the request headers
///
/// The transport layer owns header/cookie conventions; the pipeline
/// only sees this normalized form.
fn request_meta(request: &Request) -> RequestMeta {
    let headers = request.headers();

    let session_cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                (name == SESSION_COOKIE).then(|| value.to_string())
            })
        });

    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let guest_token = headers
        .get(X_GUEST_TOKEN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let client_addr = headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());

    RequestMeta {
        session_cookie,
        authorization,
        guest_token,
        client_addr,
    }
}

/// Configure CORS middleware
///
/// Allows cross-origin requests from any origin with common HTTP
/// methods. In production, restrict allowed origins to known domains.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static(X_REQUEST_ID),
            HeaderName::from_static(X_GUEST_TOKEN),
        ])
        .expose_headers([HeaderName::from_static(X_REQUEST_ID)])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Request ID middleware
///
/// Generates or extracts a unique request ID, stores it in the request
/// extensions, and echoes it in the response headers.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).await;

    response.headers_mut().insert(
        X_REQUEST_ID,
        HeaderValue::from_str(&request_id.to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("invalid-uuid")),
    );

    response
}

/// Request logging middleware
///
/// Logs all requests with method, URI, status, and latency, correlated
/// by request ID.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .extensions()
        .get::<Uuid>()
        .copied()
        .unwrap_or_else(Uuid::new_v4);

    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        "Incoming request"
    );

    let start = std::time::Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed();

    let status = response.status();
    let level = match status.as_u16() {
        500..=599 => tracing::Level::ERROR,
        400..=499 => tracing::Level::WARN,
        _ => tracing::Level::INFO,
    };

    tracing::event!(
        level,
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        duration_ms = elapsed.as_millis() as u64,
        "Request completed"
    );

    response
}
