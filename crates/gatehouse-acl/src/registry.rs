//! Predicate and permission-set registries.
//!
//! A [`Registry`] maps the names used in text ACLs to predicates, predicate
//! families and permission sets. Registries are plain values: the parser
//! receives one explicitly, so several independent policy configurations can
//! coexist in one process.
//!
//! Registration happens at configuration time. A registry is read-only while
//! decisions are being made; share it behind an `Arc` if several threads
//! evaluate concurrently.
//!
//! # Example
//!
//! ```
//! use gatehouse_acl::{Context, PermissionSet, Registry};
//! use gatehouse_acl::predicate::parse_predicate;
//!
//! let mut registry = Registry::with_defaults();
//! registry
//!     .register_predicate("weekend", |ctx: &Context| -> gatehouse_acl::Result<bool> {
//!         Ok(ctx.get("weekday").and_then(|v| v.as_u64()).is_some_and(|d| d >= 6))
//!     })
//!     .register_permission_set("docs", PermissionSet::members(["doc.read", "doc.list"]));
//!
//! assert!(registry.predicate("WEEKEND").is_some());
//! assert!(parse_predicate("Weekend", &registry).is_ok());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::permission::{self, PermissionSet};
use crate::predicate::{
    Active, Always, Anonymous, Authenticated, InGroup, IsUser, Predicate, PredicateRef,
};

/// Builds a predicate from the argument of a `NAME:argument` token.
pub type PredicateFamily = Arc<dyn Fn(&str) -> Arc<dyn Predicate> + Send + Sync>;

/// Name → predicate / permission-set lookup tables.
#[derive(Clone, Default)]
pub struct Registry {
    predicates: HashMap<String, PredicateRef>,
    families: HashMap<String, PredicateFamily>,
    permission_sets: HashMap<String, PermissionSet>,
}

impl Registry {
    /// A registry with nothing registered.
    ///
    /// The `ALL` permission-set token still resolves; it is not a name.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry with the built-in predicates and permission sets.
    ///
    /// Predicates: `ANY`, `AUTHENTICATED`, `ANONYMOUS`, `ACTIVE`, `WHEEL`,
    /// `ROOT`. Families: `GROUP:<group>`, `USER:<name>`. Permission sets:
    /// `ALL`, `http.read`, `http.write`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry
            .register_predicate("ANY", Always)
            .register_predicate("AUTHENTICATED", Authenticated)
            .register_predicate("ANONYMOUS", Anonymous)
            .register_predicate("ACTIVE", Active)
            .register_predicate("WHEEL", InGroup("wheel".to_string()))
            .register_predicate("ROOT", InGroup("wheel".to_string()))
            .register_predicate_family("GROUP", |group: &str| -> Arc<dyn Predicate> {
                Arc::new(InGroup(group.to_string()))
            })
            .register_predicate_family("USER", |name: &str| -> Arc<dyn Predicate> {
                Arc::new(IsUser(name.to_string()))
            })
            .register_permission_set(permission::ALL, PermissionSet::All)
            .register_permission_set(
                "http.read",
                PermissionSet::members(["http.get", "http.head", "http.options"]),
            )
            .register_permission_set(
                "http.write",
                PermissionSet::members(["http.post", "http.put", "http.patch", "http.delete"]),
            );
        registry
    }

    /// Register (or replace) a predicate under an uppercased name.
    pub fn register_predicate<P>(&mut self, name: &str, predicate: P) -> &mut Self
    where
        P: Predicate + 'static,
    {
        let key = name.to_uppercase();
        log::debug!("Registering predicate {key}");
        self.predicates
            .insert(key.clone(), PredicateRef::new(key, predicate));
        self
    }

    /// Register (or replace) a `NAME:argument` predicate family.
    pub fn register_predicate_family<F>(&mut self, name: &str, family: F) -> &mut Self
    where
        F: Fn(&str) -> Arc<dyn Predicate> + Send + Sync + 'static,
    {
        let key = name.to_uppercase();
        log::debug!("Registering predicate family {key}");
        self.families.insert(key, Arc::new(family));
        self
    }

    /// Register (or replace) a named permission set. Names are exact.
    pub fn register_permission_set(
        &mut self,
        name: impl Into<String>,
        set: PermissionSet,
    ) -> &mut Self {
        let name = name.into();
        log::debug!("Registering permission set {name}");
        self.permission_sets.insert(name, set);
        self
    }

    /// Look up a predicate by case-insensitive name.
    pub fn predicate(&self, name: &str) -> Option<&PredicateRef> {
        self.predicates.get(&name.to_uppercase())
    }

    /// Look up a predicate family by case-insensitive name.
    pub fn predicate_family(&self, name: &str) -> Option<&PredicateFamily> {
        self.families.get(&name.to_uppercase())
    }

    /// Look up a permission set by exact name.
    pub fn permission_set(&self, name: &str) -> Option<&PermissionSet> {
        self.permission_sets.get(name)
    }

    /// Registered predicate names, sorted.
    pub fn predicate_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.predicates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered permission-set names, sorted.
    pub fn permission_set_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.permission_sets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut families: Vec<&str> = self.families.keys().map(String::as_str).collect();
        families.sort_unstable();
        f.debug_struct("Registry")
            .field("predicates", &self.predicate_names())
            .field("families", &families)
            .field("permission_sets", &self.permission_set_names())
            .finish()
    }
}
