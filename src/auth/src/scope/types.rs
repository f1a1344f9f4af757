/// Scope grant definitions and validation
///
/// Provides the core ScopeGrant type: an `action:resource` permission
/// unit where either segment may be the wildcard `*`, or the bare `*`
/// grant that covers everything.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Result type for scope operations
pub type ScopeResult<T> = Result<T, ScopeError>;

/// Errors that can occur while parsing scope strings
///
/// Parsing happens at load time (role templates, token scope lists);
/// the matcher itself never sees malformed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// Empty scope string provided
    EmptyScope,
    /// Missing `action:resource` separator
    MissingSeparator(String),
    /// Scope segment is empty
    EmptySegment(String),
    /// Invalid wildcard usage
    InvalidWildcard(String),
}

impl fmt::Display for ScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyScope => write!(f, "Scope cannot be empty"),
            Self::MissingSeparator(s) => {
                write!(f, "Scope '{}' is missing the action:resource separator", s)
            }
            Self::EmptySegment(s) => write!(f, "Scope '{}' contains an empty segment", s),
            Self::InvalidWildcard(s) => write!(f, "Wildcards must be standalone: '{}'", s),
        }
    }
}

impl std::error::Error for ScopeError {}

/// A single permission grant of the form `action:resource`
///
/// Either segment may be the standalone wildcard `*`. The bare grant
/// `"*"` (no colon) satisfies every requirement unconditionally.
///
/// Scope strings are case-sensitive. Stored role templates are
/// space-separated lists of grants; see [`parse_scope_list`].
///
/// # Examples
///
/// ```
/// use wavemap_auth::scope::ScopeGrant;
/// use std::str::FromStr;
///
/// let grant = ScopeGrant::from_str("read:stations").unwrap();
/// assert_eq!(grant.action(), "read");
/// assert_eq!(grant.resource(), "stations");
///
/// let wildcard = ScopeGrant::from_str("read:*").unwrap();
/// assert!(wildcard.satisfies(&grant));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeGrant {
    /// Original scope string
    raw: String,
    /// Action segment (`*` for the wildcard)
    action: String,
    /// Resource segment (`*` for the wildcard)
    resource: String,
}

impl ScopeGrant {
    /// Parses a scope grant from a string slice
    ///
    /// # Arguments
    ///
    /// * `s` - The scope string (e.g., "read:stations", "write:*", "*")
    ///
    /// # Returns
    ///
    /// Returns a `ScopeResult<Self>` containing the parsed grant or an error
    pub fn new(s: &str) -> ScopeResult<Self> {
        if s.is_empty() {
            return Err(ScopeError::EmptyScope);
        }

        // A lone "*" grants everything; represented as "*:*" internally
        // so segment-wise matching covers it.
        if s == "*" {
            return Ok(Self {
                raw: s.to_string(),
                action: "*".to_string(),
                resource: "*".to_string(),
            });
        }

        let Some((action, resource)) = s.split_once(':') else {
            return Err(ScopeError::MissingSeparator(s.to_string()));
        };

        if resource.contains(':') {
            return Err(ScopeError::MissingSeparator(s.to_string()));
        }

        for segment in [action, resource] {
            if segment.is_empty() {
                return Err(ScopeError::EmptySegment(s.to_string()));
            }
            if segment.contains('*') && segment != "*" {
                return Err(ScopeError::InvalidWildcard(s.to_string()));
            }
        }

        Ok(Self {
            raw: s.to_string(),
            action: action.to_string(),
            resource: resource.to_string(),
        })
    }

    /// Returns the action segment
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Returns the resource segment
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Returns the raw scope string
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns whether this grant contains a wildcard segment
    pub fn has_wildcards(&self) -> bool {
        self.action == "*" || self.resource == "*"
    }

    /// Checks whether this granted scope satisfies a required scope
    ///
    /// A granted pair `(ga, gr)` satisfies a required pair `(ra, rr)` iff
    /// `ga` is `*` or equals `ra`, and `gr` is `*` or equals `rr`.
    /// Satisfaction is monotonic: more grants only help.
    pub fn satisfies(&self, required: &ScopeGrant) -> bool {
        (self.action == "*" || self.action == required.action)
            && (self.resource == "*" || self.resource == required.resource)
    }
}

impl FromStr for ScopeGrant {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for ScopeGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl Serialize for ScopeGrant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for ScopeGrant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ScopeGrant::new(&s).map_err(de::Error::custom)
    }
}

/// Parses a space-separated grant list (the stored role-template form)
///
/// Rejects the whole list on the first malformed entry; templates are
/// validated once at startup, not per request.
pub fn parse_scope_list(s: &str) -> ScopeResult<Vec<ScopeGrant>> {
    s.split_whitespace().map(ScopeGrant::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_creation() {
        let grant = ScopeGrant::new("read:stations").unwrap();
        assert_eq!(grant.action(), "read");
        assert_eq!(grant.resource(), "stations");
        assert_eq!(grant.as_str(), "read:stations");
        assert!(!grant.has_wildcards());
    }

    #[test]
    fn test_universal_grant() {
        let grant = ScopeGrant::new("*").unwrap();
        assert!(grant.has_wildcards());
        assert_eq!(grant.as_str(), "*");
    }

    #[test]
    fn test_wildcard_segments() {
        let grant = ScopeGrant::new("read:*").unwrap();
        assert!(grant.has_wildcards());

        let grant = ScopeGrant::new("*:stations").unwrap();
        assert!(grant.has_wildcards());
    }

    #[test]
    fn test_empty_scope() {
        assert!(matches!(ScopeGrant::new(""), Err(ScopeError::EmptyScope)));
    }

    #[test]
    fn test_missing_separator() {
        assert!(matches!(
            ScopeGrant::new("read"),
            Err(ScopeError::MissingSeparator(_))
        ));
        assert!(matches!(
            ScopeGrant::new("read:stations:extra"),
            Err(ScopeError::MissingSeparator(_))
        ));
    }

    #[test]
    fn test_empty_segment() {
        assert!(matches!(
            ScopeGrant::new("read:"),
            Err(ScopeError::EmptySegment(_))
        ));
        assert!(matches!(
            ScopeGrant::new(":stations"),
            Err(ScopeError::EmptySegment(_))
        ));
    }

    #[test]
    fn test_embedded_wildcard_rejected() {
        assert!(matches!(
            ScopeGrant::new("rea*:stations"),
            Err(ScopeError::InvalidWildcard(_))
        ));
        assert!(matches!(
            ScopeGrant::new("read:station*"),
            Err(ScopeError::InvalidWildcard(_))
        ));
    }

    #[test]
    fn test_case_sensitivity() {
        let grant = ScopeGrant::new("Read:Stations").unwrap();
        let required = ScopeGrant::new("read:stations").unwrap();
        assert!(!grant.satisfies(&required));
    }

    #[test]
    fn test_parse_scope_list() {
        let grants = parse_scope_list("read:stations write:stations read:bands").unwrap();
        assert_eq!(grants.len(), 3);
        assert_eq!(grants[1].as_str(), "write:stations");
    }

    #[test]
    fn test_parse_scope_list_rejects_malformed() {
        assert!(parse_scope_list("read:stations badscope").is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let grant = ScopeGrant::new("write:bands").unwrap();
        let json = serde_json::to_string(&grant).unwrap();
        assert_eq!(json, "\"write:bands\"");

        let back: ScopeGrant = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grant);

        let bad: Result<ScopeGrant, _> = serde_json::from_str("\"nocolon\"");
        assert!(bad.is_err());
    }
}
