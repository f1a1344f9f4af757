//! Session seam
//!
//! Sessions are owned by the surrounding application; the resolver only
//! needs a read path. The in-memory store backs tests and
//! single-process deployments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::StoreError;
use crate::types::{Role, Tier};

/// A validated login session
#[derive(Debug, Clone)]
pub struct Session {
    /// Owning user id (without the "user:" prefix)
    pub user_id: String,

    /// Role assigned at login
    pub role: Role,

    /// Rate-limit tier assigned at login
    pub tier: Tier,

    /// Session freshness bound
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Read path for session credentials
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Looks up a session by its opaque id
    async fn load(&self, session_id: &str) -> Result<Option<Session>, StoreError>;
}

/// Process-local [`SessionStore`] implementation
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, Session>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a session and returns its opaque id
    pub fn create(&self, session: Session) -> String {
        let id = format!("wms_{}", Uuid::new_v4().simple());
        self.sessions.insert(id.clone(), session);
        id
    }

    /// Drops a session
    pub fn remove(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.get(session_id).map(|s| s.clone()))
    }
}
