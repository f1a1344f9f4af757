/// Set-cover matching of granted scopes against required permissions
///
/// The matcher is pure and total over well-formed grants: malformed
/// scope strings are rejected at load time, never here.

use super::types::ScopeGrant;

/// Checks whether every required grant has at least one satisfying
/// granted scope
///
/// There is no partial credit: a single uncovered requirement fails the
/// whole set. Order of grants is irrelevant.
pub fn is_satisfied(required: &[ScopeGrant], granted: &[ScopeGrant]) -> bool {
    required
        .iter()
        .all(|req| granted.iter().any(|grant| grant.satisfies(req)))
}

/// Returns the required grants with no satisfying granted scope
///
/// Preserves the original requirement order and deduplicates repeated
/// requirements. Intended for diagnostics (403 response bodies).
pub fn missing(required: &[ScopeGrant], granted: &[ScopeGrant]) -> Vec<ScopeGrant> {
    let mut out: Vec<ScopeGrant> = Vec::new();
    for req in required {
        if granted.iter().any(|grant| grant.satisfies(req)) {
            continue;
        }
        if !out.contains(req) {
            out.push(req.clone());
        }
    }
    out
}
