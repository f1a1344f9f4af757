//! API error mapping
//!
//! Every pipeline denial maps deterministically to an HTTP status and a
//! structured JSON body; nothing propagates as an unhandled fault.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;
use wavemap_auth::AuthError;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Auth(err) => denial(err),
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "error": msg }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Maps a pipeline denial to its status and response body
fn denial(err: AuthError) -> (StatusCode, serde_json::Value) {
    match err {
        AuthError::CredentialMissing | AuthError::CredentialInvalidOrExpired => (
            StatusCode::UNAUTHORIZED,
            json!({ "success": false, "error": err.to_string() }),
        ),
        AuthError::InvalidToken => (
            StatusCode::UNAUTHORIZED,
            json!({ "success": false, "error": err.to_string() }),
        ),
        AuthError::RateLimitExceeded { reset_at } => {
            let retry_after = (reset_at - chrono::Utc::now().timestamp()).max(0);
            (
                StatusCode::TOO_MANY_REQUESTS,
                json!({
                    "success": false,
                    "error": err.to_string(),
                    "retryAfterSeconds": retry_after,
                }),
            )
        }
        AuthError::CooldownActive {
            retry_after_seconds,
        } => (
            StatusCode::TOO_MANY_REQUESTS,
            json!({
                "success": false,
                "error": err.to_string(),
                "retryAfterSeconds": retry_after_seconds,
            }),
        ),
        AuthError::InsufficientPermissions { ref missing } => (
            StatusCode::FORBIDDEN,
            json!({
                "success": false,
                "error": err.to_string(),
                "missingPermissions": missing,
            }),
        ),
        AuthError::IssuanceLimitReached { .. } => (
            StatusCode::CONFLICT,
            json!({ "success": false, "error": err.to_string() }),
        ),
        AuthError::TokenNotFound => (
            StatusCode::NOT_FOUND,
            json!({ "success": false, "error": err.to_string() }),
        ),
        AuthError::StoreUnavailable(ref detail) => {
            error!(detail = %detail, "Shared store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "success": false, "error": err.to_string() }),
            )
        }
    }
}
