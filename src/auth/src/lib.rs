//! # Wavemap Authorization Pipeline
//!
//! Request-authorization core for the multi-tenant Wavemap API: resolves
//! who is calling (session user, guest, or API-token holder), decides
//! whether the caller's granted scopes satisfy a route's required
//! permissions, and enforces usage limits per caller tier.
//!
//! ## Features
//!
//! - **Hierarchical wildcard scopes** (`action:resource`, `read:*`, `*`)
//!   matched as a simple set cover
//! - **Multi-source credential resolution** with fixed precedence and
//!   no cross-source fallback once a credential is present
//! - **Charge-first fixed-window rate limiting** over a shared atomic
//!   counter store, safe across process instances
//! - **Token issuance lifecycle** with per-owner active caps and
//!   issuance cooldowns; revocation is terminal
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use wavemap_auth::{
//!     config::AuthConfig,
//!     credential::{GuestTokenSigner, InMemorySessionStore, RequestMeta},
//!     pipeline::{AuthPipeline, RouteRequirement},
//!     ratelimit::InMemoryCounterStore,
//!     token::InMemoryTokenStore,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = AuthPipeline::new(
//!         AuthConfig::builtin()?,
//!         Arc::new(InMemorySessionStore::new()),
//!         Arc::new(InMemoryTokenStore::new()),
//!         Arc::new(InMemoryCounterStore::new()),
//!         GuestTokenSigner::random(),
//!     );
//!
//!     let context = pipeline
//!         .authorize(&RequestMeta::default(), &RouteRequirement::open())
//!         .await?;
//!
//!     println!("caller: {}", context.principal.identity_id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod credential;
pub mod error;
pub mod pipeline;
pub mod ratelimit;
pub mod scope;
pub mod token;
pub mod types;

// Re-export commonly used types
pub use config::{AuthConfig, RoleScopes};
pub use credential::{CredentialResolver, GuestTokenSigner, RequestMeta};
pub use error::{AuthError, Result, StoreError};
pub use pipeline::{AuthContext, AuthPipeline, RouteRequirement};
pub use ratelimit::{FailPolicy, RateDecision, RateLimiter, TierLimits};
pub use scope::{ScopeError, ScopeGrant};
pub use token::{ApiToken, IssuancePolicy, TokenIssuer};
pub use types::{Principal, PrincipalKind, Role, Tier};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
