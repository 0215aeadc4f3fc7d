//! Predicates: named boolean functions of the evaluation context.
//!
//! An ACE applies to a requester only when its predicate holds for the
//! merged [`Context`]. Predicate tokens in text ACLs are resolved through a
//! [`Registry`] at parse time:
//!
//! | Token                     | Meaning                                   |
//! |---------------------------|-------------------------------------------|
//! | `ANY`                     | registered predicate, case-insensitive    |
//! | `!ANONYMOUS`              | negation                                  |
//! | `GROUP:editors`           | parameterised family                      |
//! | `AUTHENTICATED&GROUP:ops` | conjunction                               |
//! | `WHEEL\|USER:alice`       | disjunction (binds loosest)               |
//!
//! The built-in user predicates read the `user` context key, whose shape is
//! described by [`User`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::Context;
use crate::registry::Registry;
use crate::{Error, Result};

/// Context key holding the requesting user.
pub const USER_KEY: &str = "user";

/// A boolean function of the evaluation context.
///
/// Implementations must not fail for optional keys they do not need, and
/// should return [`Error::MissingContext`] when a required key is absent.
pub trait Predicate: Send + Sync {
    /// Evaluate against the merged context.
    fn evaluate(&self, context: &Context) -> Result<bool>;
}

impl<F> Predicate for F
where
    F: Fn(&Context) -> Result<bool> + Send + Sync,
{
    fn evaluate(&self, context: &Context) -> Result<bool> {
        self(context)
    }
}

/// A predicate together with the label it was declared under.
#[derive(Clone)]
pub struct PredicateRef {
    label: String,
    inner: Arc<dyn Predicate>,
}

impl PredicateRef {
    /// Wrap a predicate under a label.
    pub fn new<P: Predicate + 'static>(label: impl Into<String>, predicate: P) -> Self {
        Self {
            label: label.into(),
            inner: Arc::new(predicate),
        }
    }

    /// Wrap an already shared predicate.
    pub fn from_arc(label: impl Into<String>, predicate: Arc<dyn Predicate>) -> Self {
        Self {
            label: label.into(),
            inner: predicate,
        }
    }

    /// The token or name this predicate was declared as.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Evaluate against the merged context.
    pub fn evaluate(&self, context: &Context) -> Result<bool> {
        self.inner.evaluate(context)
    }
}

impl fmt::Debug for PredicateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PredicateRef").field(&self.label).finish()
    }
}

// ============================================================================
// Built-in predicates
// ============================================================================

/// Matches any requester.
#[derive(Clone, Copy, Debug, Default)]
pub struct Always;

impl Predicate for Always {
    fn evaluate(&self, _context: &Context) -> Result<bool> {
        Ok(true)
    }
}

/// Inverts another predicate.
pub struct Not(pub PredicateRef);

impl Predicate for Not {
    fn evaluate(&self, context: &Context) -> Result<bool> {
        Ok(!self.0.evaluate(context)?)
    }
}

/// Holds when every member holds; stops at the first that does not.
pub struct AllOf(pub Vec<PredicateRef>);

impl Predicate for AllOf {
    fn evaluate(&self, context: &Context) -> Result<bool> {
        for p in &self.0 {
            if !p.evaluate(context)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Holds when any member holds; stops at the first that does.
pub struct AnyOf(pub Vec<PredicateRef>);

impl Predicate for AnyOf {
    fn evaluate(&self, context: &Context) -> Result<bool> {
        for p in &self.0 {
            if p.evaluate(context)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// The requesting user, as stored under the `user` context key.
///
/// A `null` user is anonymous. An object user is authenticated unless it
/// says otherwise; a bare string is shorthand for `{"name": ...}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Login name.
    #[serde(default)]
    pub name: Option<String>,
    /// Group memberships.
    #[serde(default)]
    pub groups: Vec<String>,
    /// Whether the identity was authenticated.
    #[serde(default = "default_true")]
    pub authenticated: bool,
    /// Whether the account is active.
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl User {
    /// An authenticated, active user.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            groups: Vec::new(),
            authenticated: true,
            active: true,
        }
    }

    /// The anonymous user.
    pub fn anonymous() -> Self {
        Self {
            name: None,
            groups: Vec::new(),
            authenticated: false,
            active: false,
        }
    }

    /// Builder-style group assignment.
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style active flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Read the user out of `context`.
    pub fn from_context(context: &Context, predicate: &str) -> Result<Self> {
        match context.require(predicate, USER_KEY)? {
            Value::Null => Ok(User::anonymous()),
            Value::String(name) => Ok(User::new(name.clone())),
            value @ Value::Object(_) => serde_json::from_value(value.clone())
                .map_err(|e| Error::invalid_context(USER_KEY, e.to_string())),
            other => Err(Error::invalid_context(
                USER_KEY,
                format!(
                    "expected object, string or null, got {}",
                    crate::state::json_type_name(other)
                ),
            )),
        }
    }

    /// Whether the user belongs to `group`.
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}

impl From<User> for Value {
    fn from(user: User) -> Self {
        serde_json::json!({
            "name": user.name,
            "groups": user.groups,
            "authenticated": user.authenticated,
            "active": user.active,
        })
    }
}

/// Holds for authenticated users.
#[derive(Clone, Copy, Debug, Default)]
pub struct Authenticated;

impl Predicate for Authenticated {
    fn evaluate(&self, context: &Context) -> Result<bool> {
        Ok(User::from_context(context, "AUTHENTICATED")?.authenticated)
    }
}

/// Holds for unauthenticated requesters.
#[derive(Clone, Copy, Debug, Default)]
pub struct Anonymous;

impl Predicate for Anonymous {
    fn evaluate(&self, context: &Context) -> Result<bool> {
        Ok(!User::from_context(context, "ANONYMOUS")?.authenticated)
    }
}

/// Holds for authenticated users whose account is active.
#[derive(Clone, Copy, Debug, Default)]
pub struct Active;

impl Predicate for Active {
    fn evaluate(&self, context: &Context) -> Result<bool> {
        let user = User::from_context(context, "ACTIVE")?;
        Ok(user.authenticated && user.active)
    }
}

/// Holds for authenticated members of a group.
#[derive(Clone, Debug)]
pub struct InGroup(pub String);

impl Predicate for InGroup {
    fn evaluate(&self, context: &Context) -> Result<bool> {
        let user = User::from_context(context, "GROUP")?;
        Ok(user.authenticated && user.in_group(&self.0))
    }
}

/// Holds for the authenticated user with the given name.
#[derive(Clone, Debug)]
pub struct IsUser(pub String);

impl Predicate for IsUser {
    fn evaluate(&self, context: &Context) -> Result<bool> {
        let user = User::from_context(context, "USER")?;
        Ok(user.authenticated && user.name.as_deref() == Some(self.0.as_str()))
    }
}

// ============================================================================
// Token parsing
// ============================================================================

/// Parse a predicate token from a text ACE.
pub fn parse_predicate(token: &str, registry: &Registry) -> Result<PredicateRef> {
    let alternatives: Vec<&str> = token.split('|').collect();
    if alternatives.len() == 1 {
        return parse_conjunction(token, registry);
    }
    let members = alternatives
        .into_iter()
        .map(|alt| parse_conjunction(alt, registry))
        .collect::<Result<Vec<_>>>()?;
    Ok(PredicateRef::new(token, AnyOf(members)))
}

fn parse_conjunction(token: &str, registry: &Registry) -> Result<PredicateRef> {
    let terms: Vec<&str> = token.split('&').collect();
    if terms.len() == 1 {
        return parse_term(token, registry);
    }
    let members = terms
        .into_iter()
        .map(|term| parse_term(term, registry))
        .collect::<Result<Vec<_>>>()?;
    Ok(PredicateRef::new(token, AllOf(members)))
}

fn parse_term(token: &str, registry: &Registry) -> Result<PredicateRef> {
    let atom = token.trim_start_matches('!');
    let negations = token.len() - atom.len();
    if negations == 0 {
        return parse_atom(token, registry);
    }

    // Negations collapse by parity, so any run of `!` yields at most one `Not`.
    let inner = parse_atom(atom, registry)?;
    if negations % 2 == 1 {
        Ok(PredicateRef::new(token, Not(inner)))
    } else {
        Ok(PredicateRef::from_arc(token, inner.inner))
    }
}

fn parse_atom(token: &str, registry: &Registry) -> Result<PredicateRef> {
    if let Some((name, argument)) = token.split_once(':') {
        if argument.is_empty() {
            return Err(Error::UnknownPredicate(token.to_string()));
        }
        let family = registry
            .predicate_family(name)
            .ok_or_else(|| Error::UnknownPredicate(token.to_string()))?;
        return Ok(PredicateRef::from_arc(token, family(argument)));
    }

    registry
        .predicate(token)
        .cloned()
        .ok_or_else(|| Error::UnknownPredicate(token.to_string()))
}
