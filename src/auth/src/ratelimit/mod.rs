//! Fixed-window rate limiting and cooldown bookkeeping
//!
//! The limiter charges a request *before* the permission check ("charge
//! first"), so a request cannot bypass its quota by being cancelled
//! mid-flight or by failing a later gate. State lives in a shared
//! [`CounterStore`] that may be reached by many process instances at
//! once; every mutation is a single atomic check-and-increment against
//! that store, never a read-then-write pair.

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use memory::InMemoryCounterStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresCounterStore;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use crate::error::{AuthError, Result, StoreError};
use crate::types::{Principal, Tier};

/// Behavior when the shared counter store cannot be reached
///
/// Default is fail-closed: deny the request with `StoreUnavailable`.
/// Fail-open is an explicit opt-out for non-critical routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailPolicy {
    #[default]
    Closed,
    Open,
}

/// A fixed-window charge limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateRule {
    /// Maximum charges per window
    pub limit: u32,
    /// Window length in seconds
    pub window_seconds: u64,
}

/// Per-tier rate-limit table
///
/// Process-wide read-only constant; `Tier::Unlimited` has no entry
/// because it bypasses charging entirely.
#[derive(Debug, Clone, Copy)]
pub struct TierLimits {
    pub basic: RateRule,
    pub pro: RateRule,
}

impl TierLimits {
    /// Returns the rule for a tier, or `None` for unlimited callers
    pub fn rule_for(&self, tier: Tier) -> Option<RateRule> {
        match tier {
            Tier::Basic => Some(self.basic),
            Tier::Pro => Some(self.pro),
            Tier::Unlimited => None,
        }
    }
}

impl Default for TierLimits {
    fn default() -> Self {
        Self {
            basic: RateRule {
                limit: 60,
                window_seconds: 60,
            },
            pro: RateRule {
                limit: 600,
                window_seconds: 60,
            },
        }
    }
}

/// Outcome of a successful rate-limit charge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    /// Charges left in the current window
    pub remaining: u32,
    /// Unix timestamp (seconds) at which the window resets
    pub reset_at: i64,
}

/// Result of a store-side window increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowCharge {
    /// Charged; the request may proceed
    Allowed { remaining: u32, reset_at: i64 },
    /// Budget exhausted for the current window
    Denied { reset_at: i64 },
}

/// Result of a store-side cooldown claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownCharge {
    /// No cooldown was running; the claim is now recorded
    Claimed,
    /// A cooldown is still running
    Active { retry_after_seconds: u64 },
}

/// Shared counter backend
///
/// Implementations must make both operations atomic with respect to
/// concurrent callers on the same key: a burst of N charges against one
/// bucket yields a final count of exactly N, with no lost updates.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically rolls the window forward if elapsed, increments the
    /// bucket, and reports whether the post-increment count is within
    /// `limit`.
    async fn charge_window(
        &self,
        key: &str,
        limit: u32,
        window_seconds: u64,
        now: i64,
    ) -> std::result::Result<WindowCharge, StoreError>;

    /// Atomically claims a cooldown slot for `key` unless one newer than
    /// `cooldown_seconds` already exists.
    async fn claim_cooldown(
        &self,
        key: &str,
        cooldown_seconds: u64,
        now: i64,
    ) -> std::result::Result<CooldownCharge, StoreError>;
}

/// Rate limiter over a shared counter store
///
/// Gates requests independently of permission checks. Limit and window
/// are parameterized per call; the per-tier table lives in
/// [`crate::config::AuthConfig`] and is applied by the pipeline.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    fail_policy: FailPolicy,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self {
            store,
            fail_policy: FailPolicy::default(),
        }
    }

    /// Sets the behavior when the counter store is unreachable
    pub fn with_fail_policy(mut self, policy: FailPolicy) -> Self {
        self.fail_policy = policy;
        self
    }

    /// Charges one unit of the principal's budget for `bucket_key`
    ///
    /// Unlimited-tier principals bypass the store entirely. The charge
    /// is committed even if the request is later denied or cancelled.
    pub async fn charge(
        &self,
        principal: &Principal,
        bucket_key: &str,
        rule: RateRule,
    ) -> Result<RateDecision> {
        let now = chrono::Utc::now().timestamp();

        if principal.tier == Tier::Unlimited {
            return Ok(RateDecision {
                remaining: u32::MAX,
                reset_at: now,
            });
        }

        let key = format!("{}:{}", principal.identity_id, bucket_key);
        let charge = self
            .store
            .charge_window(&key, rule.limit, rule.window_seconds, now)
            .await;

        match charge {
            Ok(WindowCharge::Allowed {
                remaining,
                reset_at,
            }) => Ok(RateDecision {
                remaining,
                reset_at,
            }),
            Ok(WindowCharge::Denied { reset_at }) => {
                Err(AuthError::RateLimitExceeded { reset_at })
            }
            Err(err) => self.on_store_failure(err, || RateDecision {
                remaining: 0,
                reset_at: now,
            }),
        }
    }

    /// Rejects if a cooldown newer than `cooldown_seconds` exists for
    /// `(owner_id, action)`, otherwise records now as the last occurrence
    pub async fn check_and_record_cooldown(
        &self,
        owner_id: &str,
        action: &str,
        cooldown_seconds: u64,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let key = format!("cooldown:{}:{}", action, owner_id);

        match self
            .store
            .claim_cooldown(&key, cooldown_seconds, now)
            .await
        {
            Ok(CooldownCharge::Claimed) => Ok(()),
            Ok(CooldownCharge::Active {
                retry_after_seconds,
            }) => Err(AuthError::CooldownActive {
                retry_after_seconds,
            }),
            Err(err) => self.on_store_failure(err, || ()),
        }
    }

    fn on_store_failure<T>(&self, err: StoreError, fallback: impl FnOnce() -> T) -> Result<T> {
        match self.fail_policy {
            FailPolicy::Closed => {
                warn!(error = %err, "Counter store unreachable, failing closed");
                Err(AuthError::StoreUnavailable(err.to_string()))
            }
            FailPolicy::Open => {
                warn!(error = %err, "Counter store unreachable, failing open");
                Ok(fallback())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::parse_scope_list;
    use crate::types::{PrincipalKind, Role};

    fn principal(tier: Tier) -> Principal {
        Principal::new(
            "user:77",
            PrincipalKind::User,
            Role::User,
            parse_scope_list("read:stations").unwrap(),
            tier,
        )
    }

    #[tokio::test]
    async fn test_charge_decrements_remaining() {
        let limiter = RateLimiter::new(Arc::new(InMemoryCounterStore::new()));
        let rule = RateRule {
            limit: 3,
            window_seconds: 60,
        };
        let p = principal(Tier::Basic);

        for expected in [2, 1, 0] {
            let decision = limiter.charge(&p, "api", rule).await.unwrap();
            assert_eq!(decision.remaining, expected);
        }

        let denied = limiter.charge(&p, "api", rule).await;
        assert!(matches!(denied, Err(AuthError::RateLimitExceeded { .. })));
    }

    #[tokio::test]
    async fn test_unlimited_tier_bypasses_store() {
        let limiter = RateLimiter::new(Arc::new(InMemoryCounterStore::new()));
        let rule = RateRule {
            limit: 1,
            window_seconds: 60,
        };
        let p = principal(Tier::Unlimited);

        for _ in 0..10 {
            assert!(limiter.charge(&p, "api", rule).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_separate_buckets_are_independent() {
        let limiter = RateLimiter::new(Arc::new(InMemoryCounterStore::new()));
        let rule = RateRule {
            limit: 1,
            window_seconds: 60,
        };
        let p = principal(Tier::Basic);

        assert!(limiter.charge(&p, "api", rule).await.is_ok());
        assert!(limiter.charge(&p, "export", rule).await.is_ok());
        assert!(limiter.charge(&p, "api", rule).await.is_err());
    }

    #[tokio::test]
    async fn test_cooldown_blocks_until_elapsed() {
        let limiter = RateLimiter::new(Arc::new(InMemoryCounterStore::new()));

        limiter
            .check_and_record_cooldown("user:77", "token-issue", 3600)
            .await
            .unwrap();

        let second = limiter
            .check_and_record_cooldown("user:77", "token-issue", 3600)
            .await;
        match second {
            Err(AuthError::CooldownActive {
                retry_after_seconds,
            }) => assert!(retry_after_seconds > 0 && retry_after_seconds <= 3600),
            other => panic!("expected CooldownActive, got {:?}", other),
        }
    }

    struct DownStore;

    #[async_trait]
    impl CounterStore for DownStore {
        async fn charge_window(
            &self,
            _key: &str,
            _limit: u32,
            _window_seconds: u64,
            _now: i64,
        ) -> std::result::Result<WindowCharge, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn claim_cooldown(
            &self,
            _key: &str,
            _cooldown_seconds: u64,
            _now: i64,
        ) -> std::result::Result<CooldownCharge, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_fail_closed_denies_on_store_outage() {
        let limiter = RateLimiter::new(Arc::new(DownStore));
        let rule = RateRule {
            limit: 10,
            window_seconds: 60,
        };

        let result = limiter.charge(&principal(Tier::Basic), "api", rule).await;
        assert!(matches!(result, Err(AuthError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_fail_open_allows_on_store_outage() {
        let limiter =
            RateLimiter::new(Arc::new(DownStore)).with_fail_policy(FailPolicy::Open);
        let rule = RateRule {
            limit: 10,
            window_seconds: 60,
        };

        let result = limiter.charge(&principal(Tier::Basic), "api", rule).await;
        assert!(result.is_ok());
    }
}
