//! Decision engine.
//!
//! The core loop is a strict sequential scan: for each ACE in order, the
//! predicate is evaluated against the context and the permission is tested
//! against the ACE's permission set. The first ACE for which both hold
//! decides; later ACEs are never evaluated. When nothing matches the result
//! is [`Decision::Undetermined`], which is distinct from an explicit deny and
//! left to the host to resolve.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::graph::{Protected, collect_acl, collect_context};
use crate::parser::{Ace, Acl, AclSource};
use crate::registry::Registry;
use crate::Result;

/// Outcome of evaluating an ACL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// A matching ACE allowed the permission.
    Allow,
    /// A matching ACE denied the permission.
    Deny,
    /// No ACE matched.
    Undetermined,
}

impl Decision {
    /// The decision produced by a matching ACE with `state`.
    pub fn from_state(state: bool) -> Self {
        if state { Decision::Allow } else { Decision::Deny }
    }

    /// `Some(true)` for allow, `Some(false)` for deny, `None` otherwise.
    pub fn state(&self) -> Option<bool> {
        match self {
            Decision::Allow => Some(true),
            Decision::Deny => Some(false),
            Decision::Undetermined => None,
        }
    }

    /// Whether an ACE explicitly allowed the permission.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Whether an ACE explicitly denied the permission.
    pub fn is_denied(&self) -> bool {
        matches!(self, Decision::Deny)
    }

    /// Whether no ACE matched.
    pub fn is_undetermined(&self) -> bool {
        matches!(self, Decision::Undetermined)
    }

    /// Resolve to a boolean, using `default` when undetermined.
    pub fn or_default(&self, default: bool) -> bool {
        self.state().unwrap_or(default)
    }
}

impl From<Option<bool>> for Decision {
    fn from(state: Option<bool>) -> Self {
        state.map_or(Decision::Undetermined, Decision::from_state)
    }
}

impl From<Decision> for Option<bool> {
    fn from(decision: Decision) -> Self {
        decision.state()
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Allow => write!(f, "allow"),
            Decision::Deny => write!(f, "deny"),
            Decision::Undetermined => write!(f, "undetermined"),
        }
    }
}

/// Find the first ACE whose predicate and permission set both match.
///
/// The predicate is evaluated before the permission set is consulted, so a
/// predicate that cannot be evaluated fails the whole check even when its
/// permission set would not have matched.
pub fn first_match<'a, I>(permission: &str, aces: I, context: &Context) -> Result<Option<&'a Ace>>
where
    I: IntoIterator<Item = &'a Ace>,
{
    for ace in aces {
        let predicate_matches = ace.predicate.evaluate(context)?;
        let permission_matches = ace.permission_set.matches(permission);
        log::trace!(
            "{permission}: {} {} -> predicate={predicate_matches} permission={permission_matches}",
            Decision::from_state(ace.state),
            ace.predicate.label(),
        );
        if predicate_matches && permission_matches {
            log::debug!(
                "{permission}: matched {} {} (line {:?})",
                Decision::from_state(ace.state),
                ace.predicate.label(),
                ace.line,
            );
            return Ok(Some(ace));
        }
    }
    log::debug!("{permission}: no ACE matched");
    Ok(None)
}

/// Evaluate parsed ACEs, first match wins.
pub fn check<'a, I>(permission: &str, aces: I, context: &Context) -> Result<Decision>
where
    I: IntoIterator<Item = &'a Ace>,
{
    Ok(first_match(permission, aces, context)?
        .map_or(Decision::Undetermined, |ace| Decision::from_state(ace.state)))
}

/// Parse `source` completely, then evaluate it.
///
/// Parse errors are reported before any predicate runs.
pub fn decide(
    permission: &str,
    source: &AclSource,
    registry: &Registry,
    context: &Context,
) -> Result<Decision> {
    let acl = Acl::parse(source, registry)?;
    check(permission, &acl, context)
}

/// Evaluate the effective ACL of a protected object.
///
/// The ACL is collected in child-first order; the context is the object
/// graph's merged context overlaid with `overrides`.
pub fn check_object(
    permission: &str,
    object: &dyn Protected,
    registry: &Registry,
    overrides: &Context,
) -> Result<Decision> {
    let acl = collect_acl(object, registry)?;
    let mut context = collect_context(object);
    context.merge(overrides);
    check(permission, &acl, &context)
}
