//! Shared fixtures for gatehouse-acl integration tests.

use std::sync::Arc;

use gatehouse_acl::{AceEntry, AclNode, Context, User};
use serde_json::Value;

/// ACL that lets wheel members do anything and denies everyone else.
pub const ADMIN_ONLY: &str = "
    ALLOW WHEEL ALL     # administrators
    DENY  ANY   ALL     # everyone else
";

/// Context for a member of `wheel`.
pub fn root_context() -> Context {
    Context::new().with("user", User::new("root").with_groups(["wheel"]))
}

/// Context for an authenticated user with the given groups.
pub fn user_context(name: &str, groups: &[&str]) -> Context {
    Context::new().with("user", User::new(name).with_groups(groups.iter().copied()))
}

/// Context for an unauthenticated requester.
pub fn anonymous_context() -> Context {
    Context::new().with("user", Value::Null)
}

/// A small publishing hierarchy:
///
/// ```text
///          site
///         /    \
///     blog      wiki
///       \      /
///        article
/// ```
///
/// `site` denies writes to anonymous requesters and lets wheel do anything;
/// `blog` lets the `writers` group write; `wiki` lets any authenticated user
/// `doc.edit` through a structural entry; `article` lets its owner do anything.
pub struct Publishing {
    pub site: Arc<AclNode>,
    pub blog: Arc<AclNode>,
    pub wiki: Arc<AclNode>,
    pub article: AclNode,
}

impl Publishing {
    pub fn new() -> Self {
        let site = Arc::new(
            AclNode::new("site")
                .with_acl("ALLOW WHEEL ALL\nDENY ANONYMOUS http.write\nGRANT ANY http.read")
                .with_context(Context::new().with("tenant", "acme").with("section", "site")),
        );
        let blog = Arc::new(
            AclNode::new("blog")
                .with_base(site.clone())
                .with_acl("ALLOW GROUP:writers http.write")
                .with_context(Context::new().with("section", "blog")),
        );
        let wiki = Arc::new(
            AclNode::new("wiki")
                .with_base(site.clone())
                .with_acl(AceEntry::new("ALLOW", "AUTHENTICATED", "doc.edit"))
                .with_context(Context::new().with("section", "wiki")),
        );
        let article = AclNode::new("article")
            .with_base(blog.clone())
            .with_base(wiki.clone())
            .with_acl("ALLOW USER:alice ALL");

        Self {
            site,
            blog,
            wiki,
            article,
        }
    }
}
