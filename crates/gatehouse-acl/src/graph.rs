//! Protected objects and the inheritance graph between them.
//!
//! Any type can be protected by implementing [`Protected`]. An object may
//! name zero or more *bases*; together these form a directed acyclic graph
//! that is walked in two orders:
//!
//! - [`acl_order`]: child first, then each base's walk in declaration order.
//!   An object's own ACEs therefore precede (and override) inherited ones.
//! - [`context_order`]: the mirror image, bases first and the object last, so
//!   that merging contexts left to right lets descendants override ancestors.
//!
//! Neither walk deduplicates: in a diamond the shared ancestor is visited
//! once per path. Cycles are not detected and must not be constructed.
//!
//! ```
//! use std::sync::Arc;
//! use gatehouse_acl::graph::{AclNode, acl_order, context_order};
//!
//! let b1 = Arc::new(AclNode::new("b1"));
//! let b2 = Arc::new(AclNode::new("b2"));
//! let root = AclNode::new("root").with_base(b1).with_base(b2);
//!
//! let names = |nodes: Vec<&dyn gatehouse_acl::Protected>| {
//!     nodes.iter().map(|n| n.acl_name().to_string()).collect::<Vec<_>>()
//! };
//! assert_eq!(names(acl_order(&root)), ["root", "b1", "b2"]);
//! assert_eq!(names(context_order(&root)), ["b1", "b2", "root"]);
//! ```

use std::sync::Arc;

use crate::Result;
use crate::context::Context;
use crate::parser::{Acl, AclSource};
use crate::registry::Registry;

/// An object that carries access-control information.
///
/// Every capability is optional; the defaults describe an object with no
/// bases, no ACL and no context.
pub trait Protected {
    /// Objects this one inherits ACEs and context from, in priority order.
    fn acl_bases(&self) -> Vec<&dyn Protected> {
        Vec::new()
    }

    /// This object's own ACL.
    fn acl(&self) -> Option<&AclSource> {
        None
    }

    /// This object's own context contribution.
    fn acl_context(&self) -> Option<&Context> {
        None
    }

    /// Name used in diagnostics.
    fn acl_name(&self) -> &str {
        "<object>"
    }
}

impl<T: Protected + ?Sized> Protected for Arc<T> {
    fn acl_bases(&self) -> Vec<&dyn Protected> {
        (**self).acl_bases()
    }

    fn acl(&self) -> Option<&AclSource> {
        (**self).acl()
    }

    fn acl_context(&self) -> Option<&Context> {
        (**self).acl_context()
    }

    fn acl_name(&self) -> &str {
        (**self).acl_name()
    }
}

// ============================================================================
// Traversal
// ============================================================================

/// Child-first walk used to collect ACEs.
pub fn acl_order(root: &dyn Protected) -> Vec<&dyn Protected> {
    let mut visited = Vec::new();
    walk(root, false, &mut visited);
    visited
}

/// Parent-first walk used to merge contexts.
pub fn context_order(root: &dyn Protected) -> Vec<&dyn Protected> {
    let mut visited = Vec::new();
    walk(root, true, &mut visited);
    visited
}

fn walk<'a>(node: &'a dyn Protected, parents_first: bool, visited: &mut Vec<&'a dyn Protected>) {
    if !parents_first {
        visited.push(node);
    }
    for base in node.acl_bases() {
        walk(base, parents_first, visited);
    }
    if parents_first {
        visited.push(node);
    }
}

/// Parse and concatenate the ACLs of every object in [`acl_order`].
pub fn collect_acl(root: &dyn Protected, registry: &Registry) -> Result<Acl> {
    let mut acl = Acl::default();
    for node in acl_order(root) {
        if let Some(source) = node.acl() {
            let parsed = Acl::parse(source, registry)?;
            log::trace!("{}: {} ACE(s)", node.acl_name(), parsed.len());
            acl.extend(parsed);
        }
    }
    Ok(acl)
}

/// Merge the contexts of every object in [`context_order`].
pub fn collect_context(root: &dyn Protected) -> Context {
    let mut context = Context::new();
    for node in context_order(root) {
        if let Some(local) = node.acl_context() {
            log::trace!("{}: merging {} context key(s)", node.acl_name(), local.len());
            context.merge(local);
        }
    }
    context
}

// ============================================================================
// AclNode
// ============================================================================

/// A general-purpose protected object.
///
/// Bases are shared through `Arc`, so one node can be the base of many.
#[derive(Clone, Debug, Default)]
pub struct AclNode {
    name: String,
    bases: Vec<Arc<AclNode>>,
    acl: AclSource,
    context: Context,
}

impl AclNode {
    /// A node with no bases, ACL or context.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append a base.
    pub fn with_base(mut self, base: Arc<AclNode>) -> Self {
        self.bases.push(base);
        self
    }

    /// Replace the ACL.
    pub fn with_acl(mut self, acl: impl Into<AclSource>) -> Self {
        self.acl = acl.into();
        self
    }

    /// Replace the context.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// The node's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The node's direct bases.
    pub fn bases(&self) -> &[Arc<AclNode>] {
        &self.bases
    }
}

impl Protected for AclNode {
    fn acl_bases(&self) -> Vec<&dyn Protected> {
        self.bases.iter().map(|b| b.as_ref() as &dyn Protected).collect()
    }

    fn acl(&self) -> Option<&AclSource> {
        (!self.acl.is_empty()).then_some(&self.acl)
    }

    fn acl_context(&self) -> Option<&Context> {
        (!self.context.is_empty()).then_some(&self.context)
    }

    fn acl_name(&self) -> &str {
        &self.name
    }
}
