//! PostgreSQL counter store
//!
//! One shared table of fixed-window buckets and one of cooldown
//! checkpoints, safe for concurrent use from many process instances.
//! Both operations are single statements: the conditional upsert rolls
//! the window (or claims the cooldown) and increments in one atomic
//! command, so concurrent bursts from the same principal never lose
//! updates.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;

use super::{CooldownCharge, CounterStore, WindowCharge};
use crate::error::StoreError;

/// Shared-store [`CounterStore`] implementation over PostgreSQL
pub struct PostgresCounterStore {
    pool: PgPool,
}

impl PostgresCounterStore {
    /// Wraps an existing connection pool
    ///
    /// Deployments share one pool between the counter and token stores;
    /// see [`crate::token::postgres::connect`].
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a dedicated pool; see [`crate::token::postgres::connect`]
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        let pool = crate::token::postgres::connect(database_url).await?;
        Ok(Self::from_pool(pool))
    }
}

#[async_trait]
impl CounterStore for PostgresCounterStore {
    async fn charge_window(
        &self,
        key: &str,
        limit: u32,
        window_seconds: u64,
        now: i64,
    ) -> Result<WindowCharge, StoreError> {
        let expired_before = now - window_seconds as i64;

        let row = sqlx::query(
            r#"
            INSERT INTO rate_buckets (key, window_start, count)
            VALUES ($1, $2, 1)
            ON CONFLICT (key)
            DO UPDATE SET
                count = CASE
                    WHEN rate_buckets.window_start <= $3 THEN 1
                    ELSE rate_buckets.count + 1
                END,
                window_start = CASE
                    WHEN rate_buckets.window_start <= $3 THEN $2
                    ELSE rate_buckets.window_start
                END
            RETURNING window_start, count
            "#,
        )
        .bind(key)
        .bind(now)
        .bind(expired_before)
        .fetch_one(&self.pool)
        .await?;

        let window_start: i64 = row.try_get("window_start")?;
        let count: i64 = row.try_get("count")?;
        let reset_at = window_start + window_seconds as i64;

        if count <= limit as i64 {
            Ok(WindowCharge::Allowed {
                remaining: limit - count as u32,
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
        let expired_before = now - cooldown_seconds as i64;

        let claimed = sqlx::query(
            r#"
            INSERT INTO cooldowns (key, last_at)
            VALUES ($1, $2)
            ON CONFLICT (key)
            DO UPDATE SET last_at = EXCLUDED.last_at
            WHERE cooldowns.last_at <= $3
            RETURNING last_at
            "#,
        )
        .bind(key)
        .bind(now)
        .bind(expired_before)
        .fetch_optional(&self.pool)
        .await?;

        if claimed.is_some() {
            return Ok(CooldownCharge::Claimed);
        }

        // Claim refused: read the running cooldown for the retry hint.
        let row = sqlx::query("SELECT last_at FROM cooldowns WHERE key = $1")
            .bind(key)
            .fetch_one(&self.pool)
            .await?;
        let last_at: i64 = row.try_get("last_at")?;
        let retry_after = (last_at + cooldown_seconds as i64 - now).max(1) as u64;

        Ok(CooldownCharge::Active {
            retry_after_seconds: retry_after,
        })
    }
}
