//! Short-lived guest tokens
//!
//! Guest tokens are stateless: a random id and expiry protected by a
//! blake3 keyed MAC, so verification needs no store round-trip. The key
//! is per-deployment; rotating it invalidates all outstanding guest
//! tokens.

use chrono::{DateTime, Utc};
use rand::RngCore;
use uuid::Uuid;

use crate::error::{AuthError, Result};

const GUEST_PREFIX: &str = "wmg_";

/// Claims carried by a verified guest token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestClaims {
    /// Random per-token identity
    pub guest_id: String,

    /// Expiry (unix seconds)
    pub expires_at: i64,
}

/// Mints and verifies guest tokens
#[derive(Clone)]
pub struct GuestTokenSigner {
    key: [u8; 32],
}

impl GuestTokenSigner {
    /// Signer with an explicit key (shared across instances)
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Signer with a process-local random key
    pub fn random() -> Self {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self { key }
    }

    /// Mints a guest token valid for `ttl_seconds` from `now`
    pub fn mint(&self, ttl_seconds: u64, now: DateTime<Utc>) -> String {
        let guest_id = Uuid::new_v4().simple().to_string();
        let expires_at = now.timestamp() + ttl_seconds as i64;
        let payload = format!("{}.{}", guest_id, expires_at);
        let mac = blake3::keyed_hash(&self.key, payload.as_bytes());

        format!("{}{}.{}", GUEST_PREFIX, payload, mac.to_hex())
    }

    /// Verifies a guest token's MAC and freshness
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<GuestClaims> {
        let body = token
            .strip_prefix(GUEST_PREFIX)
            .ok_or(AuthError::CredentialInvalidOrExpired)?;

        let mut parts = body.splitn(3, '.');
        let (guest_id, expires_at, mac_hex) = match (parts.next(), parts.next(), parts.next()) {
            (Some(id), Some(exp), Some(mac)) if !id.is_empty() => (id, exp, mac),
            _ => return Err(AuthError::CredentialInvalidOrExpired),
        };

        let expires_at: i64 = expires_at
            .parse()
            .map_err(|_| AuthError::CredentialInvalidOrExpired)?;

        let presented = blake3::Hash::from_hex(mac_hex)
            .map_err(|_| AuthError::CredentialInvalidOrExpired)?;
        let payload = format!("{}.{}", guest_id, expires_at);
        let expected = blake3::keyed_hash(&self.key, payload.as_bytes());

        // blake3::Hash equality is constant-time.
        if presented != expected {
            return Err(AuthError::CredentialInvalidOrExpired);
        }

        if now.timestamp() >= expires_at {
            return Err(AuthError::CredentialInvalidOrExpired);
        }

        Ok(GuestClaims {
            guest_id: guest_id.to_string(),
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_and_verify() {
        let signer = GuestTokenSigner::random();
        let now = Utc::now();

        let token = signer.mint(3600, now);
        let claims = signer.verify(&token, now).unwrap();
        assert_eq!(claims.expires_at, now.timestamp() + 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = GuestTokenSigner::random();
        let now = Utc::now();

        let token = signer.mint(10, now);
        let later = now + chrono::Duration::seconds(11);
        assert!(signer.verify(&token, later).is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let signer = GuestTokenSigner::random();
        let now = Utc::now();

        let token = signer.mint(3600, now);
        // Mutate the payload without re-signing.
        let forged = token.replacen('.', "9.", 1);
        assert!(signer.verify(&forged, now).is_err());
    }

    #[test]
    fn test_wrong_key_rejected() {
        let now = Utc::now();
        let token = GuestTokenSigner::random().mint(3600, now);
        assert!(GuestTokenSigner::random().verify(&token, now).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let signer = GuestTokenSigner::random();
        let now = Utc::now();

        for garbage in ["", "wmg_", "wmg_a.b", "wmg_a.b.zzzz", "not-a-token"] {
            assert!(signer.verify(garbage, now).is_err(), "{:?}", garbage);
        }
    }
}
