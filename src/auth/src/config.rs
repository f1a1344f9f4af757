//! Pipeline configuration
//!
//! Role→scope templates and tier→limit tables are process-wide
//! read-only constants: they are parsed and validated once at startup
//! and never mutated afterwards. A malformed scope string in a template
//! is a deployment misconfiguration and aborts initialization rather
//! than degrading per request.

use crate::ratelimit::{FailPolicy, TierLimits};
use crate::scope::{parse_scope_list, ScopeGrant, ScopeResult};
use crate::token::IssuancePolicy;
use crate::types::Role;

/// Built-in role templates (space-separated grant lists)
const GUEST_SCOPES: &str = "read:stations";
const USER_SCOPES: &str =
    "read:stations read:bands read:operators read:regions write:stations issue:tokens revoke:tokens";
const MODERATOR_SCOPES: &str = "read:* write:* issue:tokens revoke:tokens";
const ADMIN_SCOPES: &str = "*";

/// Immutable role→scope template table
#[derive(Debug, Clone)]
pub struct RoleScopes {
    guest: Vec<ScopeGrant>,
    user: Vec<ScopeGrant>,
    moderator: Vec<ScopeGrant>,
    admin: Vec<ScopeGrant>,
}

impl RoleScopes {
    /// Parses a template table from space-separated grant lists
    ///
    /// Fails on the first malformed grant; callers treat this as fatal
    /// at startup.
    pub fn new(
        guest: &str,
        user: &str,
        moderator: &str,
        admin: &str,
    ) -> ScopeResult<Self> {
        Ok(Self {
            guest: parse_scope_list(guest)?,
            user: parse_scope_list(user)?,
            moderator: parse_scope_list(moderator)?,
            admin: parse_scope_list(admin)?,
        })
    }

    /// The built-in template table
    pub fn builtin() -> ScopeResult<Self> {
        Self::new(GUEST_SCOPES, USER_SCOPES, MODERATOR_SCOPES, ADMIN_SCOPES)
    }

    /// Returns the scopes granted by a role template
    pub fn scopes_for(&self, role: Role) -> &[ScopeGrant] {
        match role {
            Role::Guest => &self.guest,
            Role::User => &self.user,
            Role::Moderator => &self.moderator,
            Role::Admin => &self.admin,
        }
    }
}

/// Authorization pipeline configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Role→scope template table
    pub role_scopes: RoleScopes,

    /// Per-tier rate-limit table
    pub tier_limits: TierLimits,

    /// Token issuance constants
    pub issuance: IssuancePolicy,

    /// Lifetime of minted guest tokens
    pub guest_token_ttl_seconds: u64,

    /// Behavior when a shared store is unreachable
    pub fail_policy: FailPolicy,
}

impl AuthConfig {
    /// Configuration with the built-in tables
    ///
    /// Errors only if a built-in template is malformed, which indicates
    /// a broken build and should halt startup.
    pub fn builtin() -> ScopeResult<Self> {
        Ok(Self {
            role_scopes: RoleScopes::builtin()?,
            tier_limits: TierLimits::default(),
            issuance: IssuancePolicy::default(),
            guest_token_ttl_seconds: 3600,
            fail_policy: FailPolicy::Closed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::is_satisfied;
    use std::str::FromStr;

    #[test]
    fn test_builtin_templates_parse() {
        let config = AuthConfig::builtin().unwrap();
        assert!(!config.role_scopes.scopes_for(Role::Guest).is_empty());
    }

    #[test]
    fn test_admin_template_covers_everything() {
        let roles = RoleScopes::builtin().unwrap();
        let required = vec![ScopeGrant::from_str("purge:regions").unwrap()];
        assert!(is_satisfied(&required, roles.scopes_for(Role::Admin)));
    }

    #[test]
    fn test_guest_template_is_read_only() {
        let roles = RoleScopes::builtin().unwrap();
        let write = vec![ScopeGrant::from_str("write:stations").unwrap()];
        assert!(!is_satisfied(&write, roles.scopes_for(Role::Guest)));

        let read = vec![ScopeGrant::from_str("read:stations").unwrap()];
        assert!(is_satisfied(&read, roles.scopes_for(Role::Guest)));
    }

    #[test]
    fn test_malformed_template_rejected() {
        assert!(RoleScopes::new("read:stations", "nocolon", "*", "*").is_err());
    }
}
