//! Credential resolution
//!
//! Turns raw request metadata (cookie, Authorization header, guest
//! token) into a normalized [`Principal`]. Sources are tried in a fixed
//! order and the first one present wins: a present-but-invalid
//! credential fails the request instead of falling through to the next
//! source.

mod guest;
mod session;

pub use guest::GuestTokenSigner;
pub use session::{InMemorySessionStore, Session, SessionStore};

use std::sync::Arc;
use tracing::warn;

use crate::config::RoleScopes;
use crate::error::{AuthError, Result};
use crate::token::TokenStore;
use crate::types::{Principal, PrincipalKind, Role, Tier};

/// Authorization header scheme prefixes
const BEARER_PREFIX: &str = "Bearer ";
const TOKEN_PREFIX: &str = "Token ";

/// Raw credential material extracted from a request by the transport
/// layer
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    /// Value of the session cookie, if present
    pub session_cookie: Option<String>,

    /// Raw `Authorization` header value, if present
    pub authorization: Option<String>,

    /// Guest token header/cookie value, if present
    pub guest_token: Option<String>,

    /// Client address, used to key anonymous guest principals
    pub client_addr: Option<String>,
}

impl RequestMeta {
    fn has_credential(&self) -> bool {
        self.session_cookie.is_some()
            || self.authorization.is_some()
            || self.guest_token.is_some()
    }
}

/// Resolves request metadata into a [`Principal`]
///
/// Resolution order: session cookie, then API token header, then guest
/// token. No merging across sources.
pub struct CredentialResolver {
    sessions: Arc<dyn SessionStore>,
    tokens: Arc<dyn TokenStore>,
    guest: GuestTokenSigner,
    roles: Arc<RoleScopes>,
}

impl CredentialResolver {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        tokens: Arc<dyn TokenStore>,
        guest: GuestTokenSigner,
        roles: Arc<RoleScopes>,
    ) -> Self {
        Self {
            sessions,
            tokens,
            guest,
            roles,
        }
    }

    /// Resolves the caller to a principal
    ///
    /// `allow_guest` comes from the route declaration: with no
    /// credential present it produces an anonymous guest principal
    /// instead of `CredentialMissing`.
    pub async fn resolve(&self, meta: &RequestMeta, allow_guest: bool) -> Result<Principal> {
        if let Some(session_id) = &meta.session_cookie {
            return self.resolve_session(session_id).await;
        }

        if let Some(header) = &meta.authorization {
            return self.resolve_api_token(header).await;
        }

        if let Some(token) = &meta.guest_token {
            return self.resolve_guest_token(token);
        }

        debug_assert!(!meta.has_credential());
        if allow_guest {
            return Ok(self.anonymous_guest(meta));
        }

        Err(AuthError::CredentialMissing)
    }

    async fn resolve_session(&self, session_id: &str) -> Result<Principal> {
        let session = self
            .sessions
            .load(session_id)
            .await?
            .ok_or(AuthError::CredentialInvalidOrExpired)?;

        if session.is_expired(chrono::Utc::now()) {
            return Err(AuthError::CredentialInvalidOrExpired);
        }

        Ok(Principal::new(
            format!("user:{}", session.user_id),
            PrincipalKind::User,
            session.role,
            self.roles.scopes_for(session.role).to_vec(),
            session.tier,
        ))
    }

    async fn resolve_api_token(&self, header: &str) -> Result<Principal> {
        let token_id = header
            .strip_prefix(BEARER_PREFIX)
            .or_else(|| header.strip_prefix(TOKEN_PREFIX))
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(AuthError::CredentialInvalidOrExpired)?;

        let token = self
            .tokens
            .get(token_id)
            .await?
            .filter(|t| t.is_active(chrono::Utc::now()))
            .ok_or(AuthError::CredentialInvalidOrExpired)?;

        // Bookkeeping off the critical path: a failed write never fails
        // the request.
        let store = self.tokens.clone();
        let id = token.id.clone();
        tokio::spawn(async move {
            if let Err(err) = store.touch(&id, chrono::Utc::now()).await {
                warn!(token_id = %id, error = %err, "Failed to record token use");
            }
        });

        Ok(Principal::new(
            token.owner_id.clone(),
            PrincipalKind::ApiToken,
            Role::User,
            token.scopes,
            token.tier,
        ))
    }

    fn resolve_guest_token(&self, token: &str) -> Result<Principal> {
        let claims = self.guest.verify(token, chrono::Utc::now())?;

        Ok(Principal::new(
            format!("guest:{}", claims.guest_id),
            PrincipalKind::Guest,
            Role::Guest,
            self.roles.scopes_for(Role::Guest).to_vec(),
            Tier::Basic,
        ))
    }

    fn anonymous_guest(&self, meta: &RequestMeta) -> Principal {
        let identity = match &meta.client_addr {
            Some(addr) => format!("guest:{}", addr),
            None => "guest:anonymous".to_string(),
        };

        Principal::new(
            identity,
            PrincipalKind::Guest,
            Role::Guest,
            self.roles.scopes_for(Role::Guest).to_vec(),
            Tier::Basic,
        )
    }
}
