/// Scope grammar and permission matching module
///
/// Scopes are `action:resource` permission units, possibly wildcarded,
/// matched as a simple set cover: a requirement set is satisfied only if
/// every required pair has at least one satisfying granted pair.
///
/// # Examples
///
/// ```
/// use wavemap_auth::scope::{self, ScopeGrant};
/// use std::str::FromStr;
///
/// let granted = vec![ScopeGrant::from_str("read:*").unwrap()];
/// let required = vec![ScopeGrant::from_str("read:stations").unwrap()];
///
/// assert!(scope::is_satisfied(&required, &granted));
/// ```

mod matcher;
mod types;


pub use matcher::{is_satisfied, missing};
pub use types::{parse_scope_list, ScopeError, ScopeGrant, ScopeResult};
