//! Command handlers.
//!
//! Each handler returns a report; printing and exit codes are left to the
//! binary.

use std::fmt;

use gatehouse_acl::{Acl, Context, Decision, Protected, acl_order, context_order};

use crate::cli::Command;
use crate::config::Policy;
use crate::Result;

/// Outcome of a `check`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckReport {
    /// Decision reached by the object's effective ACL.
    pub decision: Decision,
    /// State applied when the decision is undetermined.
    pub default: Option<bool>,
}

impl CheckReport {
    /// Whether the request is allowed once the default is applied.
    pub fn allowed(&self) -> bool {
        self.decision.state().or(self.default).unwrap_or(false)
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.decision)
    }
}

/// Decide `permission` on `object`.
///
/// `default` takes precedence over the policy file's `[defaults] state`.
pub fn check(
    policy: &Policy,
    object: &str,
    permission: &str,
    overrides: &Context,
    default: Option<bool>,
) -> Result<CheckReport> {
    let node = policy.object(object)?;
    let decision = policy.manager().can(permission, &**node, overrides)?;
    let default = default.or(policy.default_state());
    tracing::info!(%object, %permission, %decision, ?default, "checked");
    Ok(CheckReport { decision, default })
}

/// Lint result for a single object.
#[derive(Debug)]
pub struct LintEntry {
    /// Object name.
    pub object: String,
    /// Number of ACEs, or the first parse error.
    pub outcome: std::result::Result<usize, gatehouse_acl::Error>,
}

/// Outcome of a `lint`.
#[derive(Debug, Default)]
pub struct LintReport {
    /// One entry per object, sorted by name.
    pub entries: Vec<LintEntry>,
}

impl LintReport {
    /// Objects whose ACL failed to parse.
    pub fn errors(&self) -> impl Iterator<Item = &LintEntry> {
        self.entries.iter().filter(|e| e.outcome.is_err())
    }

    /// Whether every ACL parsed.
    pub fn is_clean(&self) -> bool {
        self.errors().next().is_none()
    }
}

impl fmt::Display for LintReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            match &entry.outcome {
                Ok(count) => writeln!(f, "ok     {} ({count} ACEs)", entry.object)?,
                Err(e) => writeln!(f, "error  {}: {e}", entry.object)?,
            }
        }
        Ok(())
    }
}

/// Parse each object's own ACL against the policy's registry.
///
/// Inherited ACEs are not re-parsed, so each error is reported once, against
/// the object that declares it.
pub fn lint(policy: &Policy) -> LintReport {
    let entries = policy
        .objects()
        .map(|(name, node)| {
            let outcome = match Protected::acl(&**node) {
                Some(source) => Acl::parse(source, policy.registry()).map(|acl| acl.len()),
                None => Ok(0),
            };
            if let Err(e) = &outcome {
                tracing::warn!(object = %name, error = %e, "ACL does not parse");
            }
            LintEntry {
                object: name.to_string(),
                outcome,
            }
        })
        .collect();
    LintReport { entries }
}

/// Outcome of a `walk`.
#[derive(Clone, Debug)]
pub struct WalkReport {
    /// Object names in ACE collection order.
    pub acl_order: Vec<String>,
    /// Object names in context merge order.
    pub context_order: Vec<String>,
    /// Context a check on the object would see, before overrides.
    pub context: Context,
}

impl fmt::Display for WalkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "acl order:     {}", self.acl_order.join(" -> "))?;
        writeln!(f, "context order: {}", self.context_order.join(" -> "))?;
        let context = serde_json::to_string_pretty(&self.context).map_err(|_| fmt::Error)?;
        writeln!(f, "context:\n{context}")
    }
}

/// Describe how `object`'s inheritance graph is walked.
pub fn walk(policy: &Policy, object: &str) -> Result<WalkReport> {
    let node = policy.object(object)?;
    let names = |nodes: Vec<&dyn Protected>| {
        nodes
            .iter()
            .map(|n| n.acl_name().to_string())
            .collect::<Vec<_>>()
    };
    Ok(WalkReport {
        acl_order: names(acl_order(&**node)),
        context_order: names(context_order(&**node)),
        context: policy.manager().build_context(&**node, &Context::new()),
    })
}

/// Run `command`, print its report, and return whether it succeeded.
pub fn execute(policy: &Policy, command: Command) -> Result<bool> {
    match command {
        Command::Check {
            object,
            permission,
            set,
            default,
        } => {
            let overrides: Context = set.into_iter().collect();
            let report = check(policy, &object, &permission, &overrides, default)?;
            println!("{report}");
            Ok(report.allowed())
        }
        Command::Lint => {
            let report = lint(policy);
            print!("{report}");
            Ok(report.is_clean())
        }
        Command::Walk { object } => {
            print!("{}", walk(policy, &object)?);
            Ok(true)
        }
    }
}
