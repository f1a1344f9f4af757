//! Request handlers for the authorization-owned API surface
//!
//! Downstream domain routers (stations, bands, operators, regions)
//! attach the guard layer from [`crate::middleware`] to their own
//! routes and read the [`AuthContext`] extension; these handlers cover
//! the surface the pipeline itself owns.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use std::str::FromStr;
use validator::Validate;
use wavemap_auth::{
    scope::{self, ScopeGrant},
    token::TokenStore,
    AuthContext, AuthError, Role, Tier,
};

use crate::{
    error::{ApiError, Result},
    models::*,
    state::AppState,
};

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Returns the caller's resolved principal
///
/// Downstream services read identity, role, and tier from here instead
/// of re-deriving authorization.
pub async fn me(Extension(context): Extension<AuthContext>) -> Json<MeResponse> {
    Json(MeResponse {
        success: true,
        principal: context.principal,
    })
}

/// Mints a short-lived guest token
pub async fn issue_guest_token(State(state): State<AppState>) -> Json<GuestTokenResponse> {
    let ttl = state.pipeline.guest_token_ttl_seconds();
    let token = state.guest_signer.mint(ttl, chrono::Utc::now());

    Json(GuestTokenResponse {
        success: true,
        guest_token: token,
        expires_in_seconds: ttl,
    })
}

/// Issues an API token for the caller
pub async fn issue_token(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Json(req): Json<IssueTokenRequest>,
) -> Result<Json<IssuedTokenResponse>> {
    req.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let scopes = req
        .scopes
        .iter()
        .map(|s| ScopeGrant::from_str(s))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    // A token never grants more than its owner holds.
    let missing = scope::missing(&scopes, &context.principal.granted_scopes);
    if !missing.is_empty() {
        return Err(AuthError::InsufficientPermissions { missing }.into());
    }
    if tier_rank(req.tier) > tier_rank(context.principal.tier) {
        return Err(ApiError::Validation(format!(
            "Requested tier '{}' exceeds caller tier '{}'",
            req.tier, context.principal.tier
        )));
    }

    let expires_at = req
        .expires_in_seconds
        .map(|secs| chrono::Utc::now() + chrono::Duration::seconds(secs as i64));

    let token = state
        .issuer
        .issue(
            &context.principal.identity_id,
            req.tier,
            scopes,
            expires_at,
        )
        .await?;

    Ok(Json(IssuedTokenResponse {
        success: true,
        token: token.into(),
    }))
}

/// Revokes an API token
pub async fn revoke_token(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Path(token_id): Path<String>,
) -> Result<Json<RevokedResponse>> {
    let token = state
        .issuer
        .store()
        .get(&token_id)
        .await
        .map_err(AuthError::from)?
        .ok_or(AuthError::TokenNotFound)?;

    // Owner-or-admin only; unknown and foreign ids are indistinguishable.
    let is_owner = token.owner_id == context.principal.identity_id;
    if !is_owner && context.principal.role != Role::Admin {
        return Err(AuthError::TokenNotFound.into());
    }

    state.issuer.revoke(&token_id).await?;

    Ok(Json(RevokedResponse { success: true }))
}

fn tier_rank(tier: Tier) -> u8 {
    match tier {
        Tier::Basic => 0,
        Tier::Pro => 1,
        Tier::Unlimited => 2,
    }
}
