//! Fixed-window limiter behavior against the shared counter store

use std::sync::Arc;
use std::time::Duration;

use wavemap_auth::{
    ratelimit::{InMemoryCounterStore, RateLimiter, RateRule},
    scope::parse_scope_list,
    AuthError, Principal, PrincipalKind, Role, Tier,
};

fn principal(id: &str, tier: Tier) -> Principal {
    Principal::new(
        id,
        PrincipalKind::User,
        Role::User,
        parse_scope_list("read:stations").unwrap(),
        tier,
    )
}

#[tokio::test]
async fn test_budget_counts_down_then_denies() {
    let limiter = RateLimiter::new(Arc::new(InMemoryCounterStore::new()));
    let rule = RateRule {
        limit: 3,
        window_seconds: 60,
    };
    let p = principal("user:1", Tier::Basic);

    for expected_remaining in [2, 1, 0] {
        let decision = limiter.charge(&p, "api", rule).await.unwrap();
        assert_eq!(decision.remaining, expected_remaining);
    }

    match limiter.charge(&p, "api", rule).await {
        Err(AuthError::RateLimitExceeded { reset_at }) => {
            assert!(reset_at > chrono::Utc::now().timestamp());
        }
        other => panic!("expected RateLimitExceeded, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fresh_window_after_elapse() {
    let limiter = RateLimiter::new(Arc::new(InMemoryCounterStore::new()));
    let rule = RateRule {
        limit: 1,
        window_seconds: 2,
    };
    let p = principal("user:1", Tier::Basic);

    limiter.charge(&p, "api", rule).await.unwrap();
    assert!(limiter.charge(&p, "api", rule).await.is_err());

    tokio::time::sleep(Duration::from_millis(2200)).await;

    let decision = limiter.charge(&p, "api", rule).await.unwrap();
    assert_eq!(decision.remaining, 0);
}

#[tokio::test]
async fn test_principals_do_not_share_buckets() {
    let limiter = Arc::new(RateLimiter::new(Arc::new(InMemoryCounterStore::new())));
    let rule = RateRule {
        limit: 1,
        window_seconds: 60,
    };

    assert!(limiter
        .charge(&principal("user:1", Tier::Basic), "api", rule)
        .await
        .is_ok());
    assert!(limiter
        .charge(&principal("user:2", Tier::Basic), "api", rule)
        .await
        .is_ok());
    assert!(limiter
        .charge(&principal("user:1", Tier::Basic), "api", rule)
        .await
        .is_err());
}

#[tokio::test]
async fn test_concurrent_burst_has_no_lost_updates() {
    let limiter = Arc::new(RateLimiter::new(Arc::new(InMemoryCounterStore::new())));
    let limit = 40u32;
    let attempts = 100u32;
    let rule = RateRule {
        limit,
        window_seconds: 60,
    };

    let mut handles = Vec::new();
    for _ in 0..attempts {
        let limiter = limiter.clone();
        handles.push(tokio::spawn(async move {
            limiter
                .charge(&principal("user:burst", Tier::Pro), "api", rule)
                .await
        }));
    }

    let mut allowed = 0;
    let mut denied = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => allowed += 1,
            Err(AuthError::RateLimitExceeded { .. }) => denied += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    // Exactly `limit` requests succeed; the remainder are denied.
    assert_eq!(allowed, limit);
    assert_eq!(denied, attempts - limit);
}

#[tokio::test]
async fn test_cooldown_blocks_then_releases() {
    let limiter = RateLimiter::new(Arc::new(InMemoryCounterStore::new()));

    limiter
        .check_and_record_cooldown("user:9", "token-issue", 2)
        .await
        .unwrap();

    assert!(matches!(
        limiter
            .check_and_record_cooldown("user:9", "token-issue", 2)
            .await,
        Err(AuthError::CooldownActive { .. })
    ));

    tokio::time::sleep(Duration::from_millis(2200)).await;

    assert!(limiter
        .check_and_record_cooldown("user:9", "token-issue", 2)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_cooldowns_are_per_action() {
    let limiter = RateLimiter::new(Arc::new(InMemoryCounterStore::new()));

    limiter
        .check_and_record_cooldown("user:9", "token-issue", 3600)
        .await
        .unwrap();

    // A different action for the same owner is unaffected.
    assert!(limiter
        .check_and_record_cooldown("user:9", "export", 3600)
        .await
        .is_ok());
}
