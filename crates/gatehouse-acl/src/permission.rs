//! Permission sets and permission matching.
//!
//! A permission is a flat, conventionally dotted string (`http.get`,
//! `doc.read`). A [`PermissionSet`] describes which permissions an ACE
//! governs. Sets come from two places:
//!
//! - **Tokens** in text ACLs, parsed by [`parse_permission_set`]: the
//!   literal `ALL`, a name registered in a [`Registry`], a glob pattern
//!   (`http.*`), or a comma-separated union of those.
//! - **Literals** in structural ACEs, used as-is: a string matches only by
//!   equality, an array by membership.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::registry::Registry;
use crate::{Error, Result};

/// The token that matches every permission.
pub const ALL: &str = "ALL";

/// Application-defined permission matcher.
pub trait PermissionMatcher: Send + Sync {
    /// Whether `permission` belongs to this set.
    fn contains(&self, permission: &str) -> bool;
}

impl<F> PermissionMatcher for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn contains(&self, permission: &str) -> bool {
        self(permission)
    }
}

/// A matchable collection of permission strings.
#[derive(Clone)]
pub enum PermissionSet {
    /// Matches every permission.
    All,
    /// Matches any of an explicit list of permissions.
    Members(BTreeSet<String>),
    /// Matches permissions against a glob pattern.
    Pattern(glob::Pattern),
    /// Matches if any member set matches.
    Union(Vec<PermissionSet>),
    /// Structural literal compared by equality (or membership for arrays).
    Literal(Value),
    /// Application-defined matcher.
    Custom(Arc<dyn PermissionMatcher>),
}

impl PermissionSet {
    /// Build a set from explicit members.
    pub fn members<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PermissionSet::Members(members.into_iter().map(Into::into).collect())
    }

    /// Compile a glob pattern set.
    pub fn pattern(pattern: &str) -> Result<Self> {
        glob::Pattern::new(pattern)
            .map(PermissionSet::Pattern)
            .map_err(|e| Error::invalid_pattern(pattern, e.msg))
    }

    /// Wrap a structural literal.
    pub fn literal(value: impl Into<Value>) -> Self {
        PermissionSet::Literal(value.into())
    }

    /// Wrap an application matcher.
    pub fn custom<M: PermissionMatcher + 'static>(matcher: M) -> Self {
        PermissionSet::Custom(Arc::new(matcher))
    }

    /// Whether `permission` belongs to this set.
    pub fn matches(&self, permission: &str) -> bool {
        match self {
            PermissionSet::All => true,
            PermissionSet::Members(members) => members.contains(permission),
            PermissionSet::Pattern(pattern) => pattern.matches(permission),
            PermissionSet::Union(sets) => sets.iter().any(|s| s.matches(permission)),
            PermissionSet::Literal(value) => literal_matches(value, permission),
            PermissionSet::Custom(matcher) => matcher.contains(permission),
        }
    }
}

fn literal_matches(value: &Value, permission: &str) -> bool {
    match value {
        Value::String(s) => s == permission,
        Value::Array(items) => items.iter().any(|v| v.as_str() == Some(permission)),
        _ => false,
    }
}

impl fmt::Debug for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionSet::All => write!(f, "All"),
            PermissionSet::Members(m) => f.debug_tuple("Members").field(m).finish(),
            PermissionSet::Pattern(p) => f.debug_tuple("Pattern").field(&p.as_str()).finish(),
            PermissionSet::Union(u) => f.debug_tuple("Union").field(u).finish(),
            PermissionSet::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            PermissionSet::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Test membership of `permission` in `set`.
pub fn is_permission_in_set(permission: &str, set: &PermissionSet) -> bool {
    set.matches(permission)
}

/// Parse a permission-set token from a text ACE.
pub fn parse_permission_set(token: &str, registry: &Registry) -> Result<PermissionSet> {
    if !token.contains(',') {
        return parse_single(token, registry);
    }

    let parts = token
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| parse_single(part, registry))
        .collect::<Result<Vec<_>>>()?;

    if parts.is_empty() {
        return Err(Error::UnknownPermissionSet(token.to_string()));
    }
    Ok(PermissionSet::Union(parts))
}

fn parse_single(token: &str, registry: &Registry) -> Result<PermissionSet> {
    if token == ALL {
        return Ok(PermissionSet::All);
    }
    if let Some(set) = registry.permission_set(token) {
        return Ok(set.clone());
    }
    if token.contains(['*', '?', '[']) {
        return PermissionSet::pattern(token);
    }
    Err(Error::UnknownPermissionSet(token.to_string()))
}
