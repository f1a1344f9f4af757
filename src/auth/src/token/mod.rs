//! API token issuance, validation, and revocation
//!
//! The issuer is the write-path counterpart of the credential resolver's
//! read path. Token state machine: `Active --revoke--> Revoked`
//! (terminal). Expiry is a predicate computed at validation time from
//! `expires_at`, never a stored transition.

mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::InMemoryTokenStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresTokenStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{AuthError, Result, StoreError};
use crate::ratelimit::RateLimiter;
use crate::scope::ScopeGrant;
use crate::types::Tier;

/// Cooldown action key for token issuance
const ISSUE_ACTION: &str = "token-issue";

/// A persisted API token
///
/// Once `revoked` is set the token is permanently non-authorizing,
/// regardless of `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiToken {
    /// Opaque token identifier presented by callers
    pub id: String,

    /// Owning identity
    pub owner_id: String,

    /// Rate-limit tier granted to this token's requests
    pub tier: Tier,

    /// Scopes this token grants (not the owner's role template)
    pub scopes: Vec<ScopeGrant>,

    /// Issuance time
    pub created_at: DateTime<Utc>,

    /// Terminal revocation flag
    pub revoked: bool,

    /// Optional expiry; `None` means the token does not expire
    pub expires_at: Option<DateTime<Utc>>,

    /// Last successful resolution through this token
    pub last_used_at: Option<DateTime<Utc>>,
}

impl ApiToken {
    /// Whether the token authorizes requests at `now`
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && self.expires_at.map_or(true, |exp| now < exp)
    }
}

/// Issuance policy constants
#[derive(Debug, Clone, Copy)]
pub struct IssuancePolicy {
    /// Maximum concurrently active (non-revoked, non-expired) tokens
    /// per owner
    pub max_active_tokens: u32,

    /// Minimum seconds between issuances per owner
    pub cooldown_seconds: u64,
}

impl Default for IssuancePolicy {
    fn default() -> Self {
        Self {
            max_active_tokens: 1,
            cooldown_seconds: 604_800, // 7 days
        }
    }
}

/// Shared token storage backend
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Looks up a token by its opaque id
    async fn get(&self, id: &str) -> std::result::Result<Option<ApiToken>, StoreError>;

    /// Persists a newly issued token
    async fn insert(&self, token: &ApiToken) -> std::result::Result<(), StoreError>;

    /// Marks a token revoked; returns false when the id is unknown
    async fn revoke(&self, id: &str) -> std::result::Result<bool, StoreError>;

    /// Counts the owner's active tokens at `now`
    async fn count_active(
        &self,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<u32, StoreError>;

    /// Records a successful use of the token; best-effort
    async fn touch(
        &self,
        id: &str,
        when: DateTime<Utc>,
    ) -> std::result::Result<(), StoreError>;
}

/// Creates, validates, and revokes API tokens
pub struct TokenIssuer {
    store: Arc<dyn TokenStore>,
    limiter: Arc<RateLimiter>,
    policy: IssuancePolicy,
}

impl TokenIssuer {
    pub fn new(
        store: Arc<dyn TokenStore>,
        limiter: Arc<RateLimiter>,
        policy: IssuancePolicy,
    ) -> Self {
        Self {
            store,
            limiter,
            policy,
        }
    }

    pub fn store(&self) -> Arc<dyn TokenStore> {
        self.store.clone()
    }

    /// Issues a new token for `owner_id`
    ///
    /// Enforces the per-owner active-token cap before claiming the
    /// issuance cooldown, so a capped owner does not burn a cooldown
    /// slot on a doomed request.
    pub async fn issue(
        &self,
        owner_id: &str,
        tier: Tier,
        scopes: Vec<ScopeGrant>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ApiToken> {
        let now = Utc::now();

        let active = self.store.count_active(owner_id, now).await?;
        if active >= self.policy.max_active_tokens {
            return Err(AuthError::IssuanceLimitReached {
                max_active: self.policy.max_active_tokens,
            });
        }

        self.limiter
            .check_and_record_cooldown(owner_id, ISSUE_ACTION, self.policy.cooldown_seconds)
            .await?;

        let token = ApiToken {
            id: format!("wmt_{}", Uuid::new_v4().simple()),
            owner_id: owner_id.to_string(),
            tier,
            scopes,
            created_at: now,
            revoked: false,
            expires_at,
            last_used_at: None,
        };

        self.store.insert(&token).await?;
        info!(owner_id = %owner_id, token_id = %token.id, tier = %tier, "API token issued");

        Ok(token)
    }

    /// Revokes a token; revocation is terminal
    pub async fn revoke(&self, token_id: &str) -> Result<()> {
        if self.store.revoke(token_id).await? {
            info!(token_id = %token_id, "API token revoked");
            Ok(())
        } else {
            Err(AuthError::TokenNotFound)
        }
    }

    /// Validates a token id: unknown, revoked, and expired ids all fail
    pub async fn validate(&self, token_id: &str) -> Result<ApiToken> {
        let token = self
            .store
            .get(token_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !token.is_active(Utc::now()) {
            return Err(AuthError::InvalidToken);
        }

        Ok(token)
    }
}
