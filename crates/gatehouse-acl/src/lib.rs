//! # gatehouse-acl
//!
//! ACL evaluation core for Gatehouse.
//!
//! Given a protected object, a requested permission and a context, this crate
//! decides whether the action is allowed, denied, or undetermined:
//!
//! - [`state`]: `ALLOW`/`GRANT`/`DENY`/`REJECT` resolution
//! - [`permission`]: permission sets and matching
//! - [`predicate`]: context predicates and token parsing
//! - [`registry`]: injectable name → predicate / permission-set tables
//! - [`parser`]: text and structural ACE parsing
//! - [`graph`]: protected objects and inheritance walks
//! - [`engine`]: first-match decision loop
//! - [`manager`]: host facade with context processors and default policy
//!
//! # Example
//!
//! ```
//! use gatehouse_acl::{Context, Decision, Registry, User, decide};
//!
//! let acl = "ALLOW WHEEL ALL\nDENY ANY ALL".into();
//! let registry = Registry::with_defaults();
//!
//! let root = Context::new().with("user", User::new("root").with_groups(["wheel"]));
//! assert_eq!(decide("anything", &acl, &registry, &root).unwrap(), Decision::Allow);
//!
//! let alice = Context::new().with("user", User::new("alice"));
//! assert_eq!(decide("anything", &acl, &registry, &alice).unwrap(), Decision::Deny);
//! ```

#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod context;
pub mod engine;
pub mod error;
pub mod graph;
pub mod manager;
pub mod parser;
pub mod permission;
pub mod predicate;
pub mod registry;
pub mod state;


pub use context::Context;
pub use engine::{Decision, check, check_object, decide, first_match};
pub use error::{DenialKind, Error, Result};
pub use graph::{AclNode, Protected, acl_order, collect_acl, collect_context, context_order};
pub use manager::{AclManager, CheckOptions, http_permission};
pub use parser::{Ace, AceEntry, Acl, AclChunk, AclSource, PredicateSpec, parse_acl};
pub use permission::{PermissionMatcher, PermissionSet, is_permission_in_set};
pub use predicate::{Predicate, PredicateRef, User};
pub use registry::Registry;
pub use state::{parse_state, resolve_state};
