//! ACL and context inheritance across object graphs.

use gatehouse_acl::{
    AclSource, Context, Decision, PermissionSet, Protected, Registry, acl_order, check_object,
    collect_acl, collect_context, context_order,
};
use serde_json::json;

use crate::common::{Publishing, anonymous_context, root_context, user_context};

fn names(nodes: Vec<&dyn Protected>) -> Vec<&str> {
    nodes.into_iter().map(|n| n.acl_name()).collect()
}

#[test]
fn test_diamond_walk_orders() {
    let fixture = Publishing::new();
    assert_eq!(
        names(acl_order(&fixture.article)),
        ["article", "blog", "site", "wiki", "site"]
    );
    assert_eq!(
        names(context_order(&fixture.article)),
        ["site", "blog", "site", "wiki", "article"]
    );
}

#[test]
fn test_diamond_applies_shared_acl_twice() {
    let fixture = Publishing::new();
    let acl = collect_acl(&fixture.article, &Registry::with_defaults()).unwrap();
    // article(1) + blog(1) + site(3) + wiki(1) + site(3)
    assert_eq!(acl.len(), 9);
    let structural = acl.iter().filter(|ace| ace.line.is_none()).count();
    assert_eq!(structural, 1);
}

#[test]
fn test_context_merge_order() {
    let fixture = Publishing::new();
    let ctx = collect_context(&fixture.article);
    // wiki is the later base, so its section wins over blog's and site's.
    assert_eq!(ctx.get("section"), Some(&json!("wiki")));
    assert_eq!(ctx.get("tenant"), Some(&json!("acme")));

    let blog_ctx = collect_context(&fixture.blog);
    assert_eq!(blog_ctx.get("section"), Some(&json!("blog")));
    assert_eq!(collect_context(&fixture.site).get("section"), Some(&json!("site")));
}

#[test]
fn test_inherited_decisions() {
    let fixture = Publishing::new();
    let registry = Registry::with_defaults();
    let decide = |permission: &str, ctx: &Context| {
        check_object(permission, &fixture.article, &registry, ctx).unwrap()
    };

    // Owner rule on the article itself.
    assert_eq!(decide("doc.delete", &user_context("alice", &[])), Decision::Allow);
    // Writers inherit from blog.
    assert_eq!(decide("http.post", &user_context("bob", &["writers"])), Decision::Allow);
    // Wheel inherits from site.
    assert_eq!(decide("doc.delete", &root_context()), Decision::Allow);
    // Anonymous writes hit site's deny.
    assert_eq!(decide("http.post", &anonymous_context()), Decision::Deny);
    // Authenticated edits come from wiki.
    assert_eq!(decide("doc.edit", &user_context("carol", &[])), Decision::Allow);
    // Nothing covers an authenticated non-writer posting.
    assert_eq!(decide("http.post", &user_context("carol", &[])), Decision::Undetermined);
}

#[test]
fn test_child_rule_overrides_parent() {
    let fixture = Publishing::new();
    let registry = Registry::with_defaults();
    // wiki alone allows authenticated edits; site alone has nothing for it.
    assert_eq!(
        check_object("doc.edit", fixture.wiki.as_ref(), &registry, &user_context("dan", &[]))
            .unwrap(),
        Decision::Allow
    );
    assert_eq!(
        check_object("doc.edit", fixture.site.as_ref(), &registry, &user_context("dan", &[]))
            .unwrap(),
        Decision::Undetermined
    );
}

/// A domain type that borrows its parent instead of sharing it.
struct Folder {
    name: String,
    acl: AclSource,
    context: Context,
}

struct File<'a> {
    name: String,
    folder: &'a Folder,
    acl: AclSource,
}

impl Protected for Folder {
    fn acl(&self) -> Option<&AclSource> {
        Some(&self.acl)
    }

    fn acl_context(&self) -> Option<&Context> {
        Some(&self.context)
    }

    fn acl_name(&self) -> &str {
        &self.name
    }
}

impl Protected for File<'_> {
    fn acl_bases(&self) -> Vec<&dyn Protected> {
        vec![self.folder as &dyn Protected]
    }

    fn acl(&self) -> Option<&AclSource> {
        Some(&self.acl)
    }

    fn acl_name(&self) -> &str {
        &self.name
    }
}

#[test]
fn test_borrowed_domain_objects() {
    let folder = Folder {
        name: "finance".to_string(),
        acl: "ALLOW GROUP:finance file.*\nDENY ANY ALL".into(),
        context: Context::new().with("classification", "internal"),
    };
    let file = File {
        name: "q3.xlsx".to_string(),
        folder: &folder,
        acl: "ALLOW USER:ceo file.read".into(),
    };
    let mut registry = Registry::with_defaults();
    registry.register_permission_set("file.read", PermissionSet::members(["file.read"]));

    assert_eq!(names(acl_order(&file)), ["q3.xlsx", "finance"]);
    assert_eq!(
        collect_context(&file).get("classification"),
        Some(&json!("internal"))
    );
    assert_eq!(
        check_object("file.read", &file, &registry, &user_context("ceo", &[])).unwrap(),
        Decision::Allow
    );
    assert_eq!(
        check_object("file.write", &file, &registry, &user_context("ceo", &[])).unwrap(),
        Decision::Deny
    );
    assert_eq!(
        check_object("file.write", &file, &registry, &user_context("fin", &["finance"]))
            .unwrap(),
        Decision::Allow
    );
}

#[test]
fn test_bare_permission_token_needs_registration() {
    let folder = Folder {
        name: "finance".to_string(),
        acl: "ALLOW ANY file.read".into(),
        context: Context::new(),
    };
    assert!(matches!(
        check_object("file.read", &folder, &Registry::with_defaults(), &Context::new()),
        Err(gatehouse_acl::Error::UnknownPermissionSet(ref name)) if name == "file.read"
    ));
}
