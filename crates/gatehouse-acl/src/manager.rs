//! Host-facing facade.
//!
//! [`AclManager`] bundles what an application configures once at startup:
//! a [`Registry`] of predicates and permission sets, context processors that
//! contribute request-level context, and the default state applied when an
//! ACL is undetermined.
//!
//! Context for a check is assembled in three layers, later layers winning:
//!
//! 1. the protected object's graph-merged context,
//! 2. the output of each context processor, in registration order,
//! 3. the caller's overrides.
//!
//! ```
//! use gatehouse_acl::{AclManager, AclNode, Context, Decision, User};
//!
//! let mut manager = AclManager::new();
//! manager.context_processor(|| Context::new().with("user", User::new("alice")));
//!
//! let page = AclNode::new("page").with_acl("ALLOW AUTHENTICATED http.read\nDENY ANY ALL");
//! assert_eq!(manager.can("http.get", &page, &Context::new()).unwrap(), Decision::Allow);
//! assert_eq!(manager.can("http.post", &page, &Context::new()).unwrap(), Decision::Deny);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::engine::{Decision, check};
use crate::error::DenialKind;
use crate::graph::{Protected, collect_acl, collect_context};
use crate::permission::PermissionSet;
use crate::predicate::{Predicate, User};
use crate::registry::Registry;
use crate::{Error, Result};

/// Produces request-level context for every check.
pub type ContextProcessor = Box<dyn Fn() -> Context + Send + Sync>;

/// Per-call options for [`AclManager::ensure`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CheckOptions {
    /// State to use when the ACL is undetermined; falls back to the
    /// manager's default state.
    pub default: Option<bool>,
    /// Report denials as [`DenialKind::NotFound`].
    pub stealth: bool,
}

/// Registry, context processors and default policy for an application.
pub struct AclManager {
    registry: Registry,
    processors: Vec<ContextProcessor>,
    default_state: Option<bool>,
}

impl AclManager {
    /// A manager with the built-in registry and no default state.
    pub fn new() -> Self {
        Self::with_registry(Registry::with_defaults())
    }

    /// A manager using `registry`.
    pub fn with_registry(registry: Registry) -> Self {
        Self {
            registry,
            processors: Vec::new(),
            default_state: None,
        }
    }

    /// The registry ACLs are parsed against.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Register (or replace) a predicate.
    pub fn predicate<P: Predicate + 'static>(&mut self, name: &str, predicate: P) -> &mut Self {
        self.registry.register_predicate(name, predicate);
        self
    }

    /// Register (or replace) a `NAME:argument` predicate family.
    pub fn predicate_family<F>(&mut self, name: &str, family: F) -> &mut Self
    where
        F: Fn(&str) -> Arc<dyn Predicate> + Send + Sync + 'static,
    {
        self.registry.register_predicate_family(name, family);
        self
    }

    /// Register (or replace) a named permission set.
    pub fn permission_set(&mut self, name: impl Into<String>, set: PermissionSet) -> &mut Self {
        self.registry.register_permission_set(name, set);
        self
    }

    /// Add a context processor.
    pub fn context_processor<F>(&mut self, processor: F) -> &mut Self
    where
        F: Fn() -> Context + Send + Sync + 'static,
    {
        self.processors.push(Box::new(processor));
        self
    }

    /// Set the state used by [`ensure`](Self::ensure) when undetermined.
    pub fn set_default_state(&mut self, state: Option<bool>) -> &mut Self {
        self.default_state = state;
        self
    }

    /// The configured default state.
    pub fn default_state(&self) -> Option<bool> {
        self.default_state
    }

    /// Assemble the context a check on `object` would see.
    pub fn build_context(&self, object: &dyn Protected, overrides: &Context) -> Context {
        let mut context = collect_context(object);
        for processor in &self.processors {
            context.merge(&processor());
        }
        context.merge(overrides);
        context
    }

    /// Decide whether `permission` is granted on `object`.
    pub fn can(
        &self,
        permission: &str,
        object: &dyn Protected,
        overrides: &Context,
    ) -> Result<Decision> {
        let acl = collect_acl(object, &self.registry)?;
        let context = self.build_context(object, overrides);
        check(permission, &acl, &context)
    }

    /// Require `permission` on `object`, applying the default policy.
    ///
    /// Returns [`Error::Denied`] when refused: `NotFound` in stealth mode,
    /// `Forbidden` for an authenticated user, `Unauthorized` otherwise.
    pub fn ensure(
        &self,
        permission: &str,
        object: &dyn Protected,
        overrides: &Context,
        options: CheckOptions,
    ) -> Result<()> {
        let acl = collect_acl(object, &self.registry)?;
        let context = self.build_context(object, overrides);
        let decision = check(permission, &acl, &context)?;

        let allowed = decision
            .state()
            .or(options.default)
            .or(self.default_state)
            .unwrap_or(false);
        if allowed {
            return Ok(());
        }

        let kind = if options.stealth {
            DenialKind::NotFound
        } else if is_authenticated(&context) {
            DenialKind::Forbidden
        } else {
            DenialKind::Unauthorized
        };
        log::info!(
            "{permission} on {} refused ({decision}): {kind}",
            object.acl_name()
        );
        Err(Error::Denied(kind))
    }
}

fn is_authenticated(context: &Context) -> bool {
    matches!(User::from_context(context, "ensure"), Ok(user) if user.authenticated)
}

impl Default for AclManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AclManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AclManager")
            .field("registry", &self.registry)
            .field("processors", &self.processors.len())
            .field("default_state", &self.default_state)
            .finish()
    }
}

/// The permission conventionally checked for an HTTP request method.
///
/// ```
/// assert_eq!(gatehouse_acl::http_permission("GET"), "http.get");
/// ```
pub fn http_permission(method: &str) -> String {
    format!("http.{}", method.to_ascii_lowercase())
}
