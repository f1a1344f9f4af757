//! Core authorization types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::scope::ScopeGrant;

/// Credential source a principal was resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrincipalKind {
    /// Session-backed interactive user
    User,
    /// Guest token or anonymous guest access
    Guest,
    /// Opaque API token
    ApiToken,
}

/// Role assigned to a principal
///
/// Roles map to static scope templates; see [`crate::config::RoleScopes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guest" => Ok(Role::Guest),
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Caller classification governing the rate-limit tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Basic,
    Pro,
    /// Bypasses rate-limit charging entirely
    Unlimited,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Basic => "basic",
            Tier::Pro => "pro",
            Tier::Unlimited => "unlimited",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Tier::Basic),
            "pro" => Ok(Tier::Pro),
            "unlimited" => Ok(Tier::Unlimited),
            other => Err(format!("unknown tier: {}", other)),
        }
    }
}

/// The resolved identity attached to a request
///
/// Produced fresh per request by the credential resolver and immutable
/// for the request's lifetime. `granted_scopes` is derived once at
/// resolution time: from the role template for sessions and guests, or
/// from the token's own scope list for API tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// Stable identity (e.g., "user:42", "guest:203.0.113.9")
    pub identity_id: String,

    /// Credential source this principal was resolved from
    pub kind: PrincipalKind,

    /// Assigned role
    pub role: Role,

    /// Scopes granted to this principal for this request
    pub granted_scopes: Vec<ScopeGrant>,

    /// Rate-limit tier
    pub tier: Tier,
}

impl Principal {
    pub fn new(
        identity_id: impl Into<String>,
        kind: PrincipalKind,
        role: Role,
        granted_scopes: Vec<ScopeGrant>,
        tier: Tier,
    ) -> Self {
        Self {
            identity_id: identity_id.into(),
            kind,
            role,
            granted_scopes,
            tier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::parse_scope_list;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Guest, Role::User, Role::Moderator, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_tier_round_trip() {
        for tier in [Tier::Basic, Tier::Pro, Tier::Unlimited] {
            assert_eq!(tier.as_str().parse::<Tier>().unwrap(), tier);
        }
    }

    #[test]
    fn test_principal_serialization() {
        let principal = Principal::new(
            "user:42",
            PrincipalKind::User,
            Role::User,
            parse_scope_list("read:stations write:stations").unwrap(),
            Tier::Basic,
        );

        let json = serde_json::to_value(&principal).unwrap();
        assert_eq!(json["identityId"], "user:42");
        assert_eq!(json["kind"], "user");
        assert_eq!(json["grantedScopes"][1], "write:stations");
        assert_eq!(json["tier"], "basic");
    }
}
