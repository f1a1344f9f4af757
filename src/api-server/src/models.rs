use serde::{Deserialize, Serialize};
use validator::Validate;
use wavemap_auth::{ApiToken, Principal, Tier};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Resolved-principal introspection response
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub success: bool,
    pub principal: Principal,
}

/// Token issuance request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IssueTokenRequest {
    /// Tier granted to the token; may not exceed the caller's own tier
    pub tier: Tier,

    /// Scopes the token grants; must be covered by the caller's grants
    #[validate(length(min = 1, max = 32))]
    pub scopes: Vec<String>,

    /// Optional lifetime; omitted means the token does not expire
    #[validate(range(min = 60))]
    pub expires_in_seconds: Option<u64>,
}

/// Issued token response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedTokenResponse {
    pub success: bool,
    pub token: TokenInfo,
}

/// Wire form of an issued token
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub id: String,
    pub owner_id: String,
    pub tier: Tier,
    pub scopes: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<ApiToken> for TokenInfo {
    fn from(token: ApiToken) -> Self {
        Self {
            id: token.id,
            owner_id: token.owner_id,
            tier: token.tier,
            scopes: token.scopes.iter().map(|s| s.to_string()).collect(),
            created_at: token.created_at,
            expires_at: token.expires_at,
        }
    }
}

/// Revocation response
#[derive(Debug, Serialize)]
pub struct RevokedResponse {
    pub success: bool,
}

/// Minted guest token response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestTokenResponse {
    pub success: bool,
    pub guest_token: String,
    pub expires_in_seconds: u64,
}
