use std::sync::Arc;
use std::time::Instant;

use wavemap_auth::{
    config::AuthConfig,
    credential::{GuestTokenSigner, InMemorySessionStore, SessionStore},
    pipeline::AuthPipeline,
    ratelimit::{CounterStore, InMemoryCounterStore},
    scope::ScopeError,
    token::{InMemoryTokenStore, TokenIssuer, TokenStore},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Authorization pipeline
    pub pipeline: Arc<AuthPipeline>,

    /// Token issuer (shares the pipeline's limiter and policy)
    pub issuer: Arc<TokenIssuer>,

    /// Guest token signer (same key the resolver verifies with)
    pub guest_signer: GuestTokenSigner,

    /// Server start time for uptime calculation
    pub start_time: Instant,

    /// Application version
    pub version: String,
}

impl AppState {
    pub fn new(
        config: AuthConfig,
        sessions: Arc<dyn SessionStore>,
        tokens: Arc<dyn TokenStore>,
        counters: Arc<dyn CounterStore>,
        guest_signer: GuestTokenSigner,
    ) -> Self {
        let pipeline = AuthPipeline::new(
            config,
            sessions,
            tokens.clone(),
            counters,
            guest_signer.clone(),
        );
        let issuer = pipeline.token_issuer(tokens);

        Self {
            pipeline: Arc::new(pipeline),
            issuer: Arc::new(issuer),
            guest_signer,
            start_time: Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// State backed entirely by in-memory stores
    ///
    /// Fails only if the built-in role templates are malformed, which
    /// should halt startup.
    pub fn in_memory() -> Result<Self, ScopeError> {
        Ok(Self::new(
            AuthConfig::builtin()?,
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryTokenStore::new()),
            Arc::new(InMemoryCounterStore::new()),
            GuestTokenSigner::random(),
        ))
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
