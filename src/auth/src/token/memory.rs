//! In-memory token store for tests and single-process deployments

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::{ApiToken, TokenStore};
use crate::error::StoreError;

/// Process-local [`TokenStore`] implementation
#[derive(Default)]
pub struct InMemoryTokenStore {
    tokens: DashMap<String, ApiToken>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get(&self, id: &str) -> Result<Option<ApiToken>, StoreError> {
        Ok(self.tokens.get(id).map(|t| t.clone()))
    }

    async fn insert(&self, token: &ApiToken) -> Result<(), StoreError> {
        self.tokens.insert(token.id.clone(), token.clone());
        Ok(())
    }

    async fn revoke(&self, id: &str) -> Result<bool, StoreError> {
        match self.tokens.get_mut(id) {
            Some(mut token) => {
                token.revoked = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_active(
        &self,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> Result<u32, StoreError> {
        let count = self
            .tokens
            .iter()
            .filter(|t| t.owner_id == owner_id && t.is_active(now))
            .count();
        Ok(count as u32)
    }

    async fn touch(&self, id: &str, when: DateTime<Utc>) -> Result<(), StoreError> {
        if let Some(mut token) = self.tokens.get_mut(id) {
            token.last_used_at = Some(when);
        }
        Ok(())
    }
}
