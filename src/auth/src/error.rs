//! Error types for the authorization pipeline

use thiserror::Error;

use crate::scope::ScopeGrant;

/// Authorization pipeline errors
///
/// Every variant is recoverable at the pipeline boundary and maps
/// deterministically to an HTTP status and a structured denial body.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential was presented on a route that requires one
    #[error("No credentials provided")]
    CredentialMissing,

    /// A credential was presented but failed validation
    #[error("Credential is invalid or expired")]
    CredentialInvalidOrExpired,

    /// The caller's fixed-window rate budget is exhausted
    #[error("Rate limit exceeded")]
    RateLimitExceeded {
        /// Unix timestamp (seconds) at which the window resets
        reset_at: i64,
    },

    /// A per-action cooldown is still running
    #[error("Action is on cooldown")]
    CooldownActive {
        /// Seconds until the cooldown expires
        retry_after_seconds: u64,
    },

    /// Granted scopes do not cover the route's required permissions
    #[error("Insufficient permissions")]
    InsufficientPermissions {
        /// Required grants with no satisfying granted scope
        missing: Vec<ScopeGrant>,
    },

    /// The per-owner cap on concurrently active tokens is hit
    #[error("Active token limit reached")]
    IssuanceLimitReached {
        /// Configured maximum of concurrently active tokens
        max_active: u32,
    },

    /// Token lookup failed: unknown, revoked, or expired
    #[error("Token is invalid")]
    InvalidToken,

    /// Revocation target does not exist
    #[error("Token not found")]
    TokenNotFound,

    /// A shared store (counters, tokens, sessions) could not be reached
    #[error("Shared store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::StoreUnavailable(err.to_string())
    }
}

/// Errors raised by shared store backends
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend unreachable or timed out
    #[error("Store unreachable: {0}")]
    Unavailable(String),

    /// Stored data could not be decoded
    #[error("Corrupt store record: {0}")]
    Corrupt(String),
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthError>;
