//! In-memory counter store
//!
//! Backs tests and single-process deployments. DashMap's sharded locks
//! make each `entry` closure atomic with respect to concurrent callers
//! on the same key, which is all the check-and-increment contract needs.

use async_trait::async_trait;
use dashmap::DashMap;

use super::{CooldownCharge, CounterStore, WindowCharge};
use crate::error::StoreError;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    window_start: i64,
    count: u32,
}

/// Process-local [`CounterStore`] implementation
#[derive(Default)]
pub struct InMemoryCounterStore {
    buckets: DashMap<String, Bucket>,
    cooldowns: DashMap<String, i64>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn charge_window(
        &self,
        key: &str,
        limit: u32,
        window_seconds: u64,
        now: i64,
    ) -> Result<WindowCharge, StoreError> {
        let mut entry = self
            .buckets
            .entry(key.to_string())
            .or_insert(Bucket {
                window_start: now,
                count: 0,
            });

        if now - entry.window_start >= window_seconds as i64 {
            entry.window_start = now;
            entry.count = 0;
        }
        entry.count = entry.count.saturating_add(1);

        let reset_at = entry.window_start + window_seconds as i64;
        if entry.count <= limit {
            Ok(WindowCharge::Allowed {
                remaining: limit - entry.count,
                reset_at,
            })
        } else {
            Ok(WindowCharge::Denied { reset_at })
        }
    }

    async fn claim_cooldown(
        &self,
        key: &str,
        cooldown_seconds: u64,
        now: i64,
    ) -> Result<CooldownCharge, StoreError> {
        let mut claimed = false;
        let mut entry = self.cooldowns.entry(key.to_string()).or_insert_with(|| {
            claimed = true;
            now
        });

        if claimed {
            return Ok(CooldownCharge::Claimed);
        }

        let elapsed = now - *entry;
        if elapsed >= cooldown_seconds as i64 {
            *entry = now;
            return Ok(CooldownCharge::Claimed);
        }

        Ok(CooldownCharge::Active {
            retry_after_seconds: (cooldown_seconds as i64 - elapsed).max(1) as u64,
        })
    }
}
