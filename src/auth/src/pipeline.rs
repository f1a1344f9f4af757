//! Pipeline orchestration
//!
//! Sequences credential resolution, rate-limit charging, and scope
//! matching for every inbound request. The charge is committed before
//! the permission check, so a request denied for missing permissions
//! has still consumed one unit of its rate budget. The pipeline holds
//! no per-request mutable state; it is safe to run arbitrarily many
//! requests through one instance concurrently.

use std::sync::Arc;
use tracing::debug;

use crate::config::AuthConfig;
use crate::credential::{CredentialResolver, GuestTokenSigner, RequestMeta, SessionStore};
use crate::error::{AuthError, Result};
use crate::ratelimit::{CounterStore, RateDecision, RateLimiter};
use crate::scope::{self, ScopeGrant};
use crate::token::{TokenIssuer, TokenStore};
use crate::types::Principal;

/// Permission declaration attached to a route by the routing layer
#[derive(Debug, Clone, Default)]
pub struct RouteRequirement {
    /// Grants the caller must cover (set-cover, no partial credit)
    pub required_permissions: Vec<ScopeGrant>,

    /// Whether the route accepts callers with no credential
    pub allow_guest_access: bool,
}

impl RouteRequirement {
    pub fn new(required_permissions: Vec<ScopeGrant>, allow_guest_access: bool) -> Self {
        Self {
            required_permissions,
            allow_guest_access,
        }
    }

    /// Requirement for an open route with no required permissions
    pub fn open() -> Self {
        Self {
            required_permissions: Vec::new(),
            allow_guest_access: true,
        }
    }
}

/// The authorized continuation handed to downstream handlers
///
/// Immutable request-scoped value; downstream handlers read
/// `principal.identity_id`, `role`, and `tier` from it and never
/// re-derive authorization.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The resolved caller
    pub principal: Principal,

    /// Rate budget left after this request's charge (`None` for
    /// unlimited-tier callers)
    pub rate: Option<RateDecision>,
}

/// Request-authorization pipeline
///
/// Resolver → rate limiter → scope matcher, in that order; each stage
/// either passes the request on or produces a terminal structured
/// denial.
pub struct AuthPipeline {
    resolver: CredentialResolver,
    limiter: Arc<RateLimiter>,
    config: AuthConfig,
}

impl AuthPipeline {
    pub fn new(
        config: AuthConfig,
        sessions: Arc<dyn SessionStore>,
        tokens: Arc<dyn TokenStore>,
        counters: Arc<dyn CounterStore>,
        guest_signer: GuestTokenSigner,
    ) -> Self {
        let limiter = Arc::new(
            RateLimiter::new(counters).with_fail_policy(config.fail_policy),
        );
        let resolver = CredentialResolver::new(
            sessions,
            tokens,
            guest_signer,
            Arc::new(config.role_scopes.clone()),
        );

        Self {
            resolver,
            limiter,
            config,
        }
    }

    /// The rate limiter shared with this pipeline (for issuance
    /// cooldowns and per-route charges)
    pub fn limiter(&self) -> Arc<RateLimiter> {
        self.limiter.clone()
    }

    /// Builds a token issuer sharing this pipeline's limiter and
    /// issuance policy
    pub fn token_issuer(&self, tokens: Arc<dyn TokenStore>) -> TokenIssuer {
        TokenIssuer::new(tokens, self.limiter.clone(), self.config.issuance)
    }

    /// Lifetime of minted guest tokens, in seconds
    pub fn guest_token_ttl_seconds(&self) -> u64 {
        self.config.guest_token_ttl_seconds
    }

    /// Authorizes one request against a route's declared requirement
    ///
    /// Returns the authorized continuation, or the structured denial
    /// for the first failing gate.
    pub async fn authorize(
        &self,
        meta: &RequestMeta,
        route: &RouteRequirement,
    ) -> Result<AuthContext> {
        let principal = self
            .resolver
            .resolve(meta, route.allow_guest_access)
            .await?;

        let rate = self.charge(&principal).await?;

        if !scope::is_satisfied(&route.required_permissions, &principal.granted_scopes) {
            let missing =
                scope::missing(&route.required_permissions, &principal.granted_scopes);
            debug!(
                identity = %principal.identity_id,
                missing = ?missing,
                "Denied: insufficient permissions"
            );
            return Err(AuthError::InsufficientPermissions { missing });
        }

        debug!(
            identity = %principal.identity_id,
            role = %principal.role,
            tier = %principal.tier,
            "Request authorized"
        );

        Ok(AuthContext { principal, rate })
    }

    async fn charge(&self, principal: &Principal) -> Result<Option<RateDecision>> {
        let Some(rule) = self.config.tier_limits.rule_for(principal.tier) else {
            return Ok(None);
        };

        let decision = self
            .limiter
            .charge(principal, principal.tier.as_str(), rule)
            .await?;

        Ok(Some(decision))
    }
}
