//! Host facade: registration, context processors and default policy.

use std::sync::{Arc, RwLock};

use gatehouse_acl::{
    AclManager, AclNode, CheckOptions, Context, Decision, DenialKind, Error, PermissionSet,
    Registry, User, http_permission,
};
use serde_json::Value;

use crate::common::{ADMIN_ONLY, Publishing};

/// Stand-in for a host's per-request "current user".
fn manager_with_current_user() -> (AclManager, Arc<RwLock<Value>>) {
    let current = Arc::new(RwLock::new(Value::Null));
    let source = current.clone();
    let mut manager = AclManager::new();
    manager.context_processor(move || {
        let user = source.read().map(|u| u.clone()).unwrap_or(Value::Null);
        Context::new().with("user", user)
    });
    (manager, current)
}

fn login(current: &Arc<RwLock<Value>>, user: User) {
    *current.write().unwrap() = user.into();
}

#[test]
fn test_route_style_checks() {
    let (manager, current) = manager_with_current_user();
    let route = AclNode::new("/admin").with_acl(ADMIN_ONLY);

    let err = manager
        .ensure(&http_permission("GET"), &route, &Context::new(), CheckOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::Denied(DenialKind::Unauthorized)));

    login(&current, User::new("alice"));
    let err = manager
        .ensure(&http_permission("GET"), &route, &Context::new(), CheckOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::Denied(kind) if kind.status_code() == 403));

    login(&current, User::new("root").with_groups(["wheel"]));
    manager
        .ensure(&http_permission("GET"), &route, &Context::new(), CheckOptions::default())
        .expect("wheel may access admin routes");
}

#[test]
fn test_overrides_beat_processors() {
    let (manager, current) = manager_with_current_user();
    login(&current, User::new("alice"));
    let route = AclNode::new("/admin").with_acl(ADMIN_ONLY);

    let impersonate = Context::new().with("user", User::new("root").with_groups(["wheel"]));
    assert_eq!(
        manager.can("http.get", &route, &impersonate).unwrap(),
        Decision::Allow
    );
}

#[test]
fn test_processors_beat_object_context() {
    let (manager, current) = manager_with_current_user();
    login(&current, User::new("alice"));
    let route = AclNode::new("/me")
        .with_acl("ALLOW USER:alice ALL")
        .with_context(Context::new().with("user", User::new("mallory")));

    assert_eq!(
        manager.can("http.get", &route, &Context::new()).unwrap(),
        Decision::Allow
    );
}

#[test]
fn test_default_state_for_open_routes() {
    let (mut manager, _current) = manager_with_current_user();
    manager.set_default_state(Some(true));
    let open = AclNode::new("/about");

    assert!(
        manager
            .ensure("http.get", &open, &Context::new(), CheckOptions::default())
            .is_ok()
    );
    let closed = CheckOptions {
        default: Some(false),
        stealth: true,
    };
    let err = manager
        .ensure("http.get", &open, &Context::new(), closed)
        .unwrap_err();
    assert!(matches!(err, Error::Denied(DenialKind::NotFound)));
}

#[test]
fn test_application_permission_sets() {
    let mut manager = AclManager::with_registry(Registry::with_defaults());
    manager
        .permission_set("publish", PermissionSet::members(["post.publish", "post.unpublish"]))
        .predicate_family("TENANT", |tenant: &str| -> Arc<dyn gatehouse_acl::Predicate> {
            let tenant = tenant.to_string();
            Arc::new(move |ctx: &Context| -> gatehouse_acl::Result<bool> {
                Ok(ctx.require("TENANT", "tenant")?.as_str() == Some(tenant.as_str()))
            })
        });

    let fixture = Publishing::new();
    let post = AclNode::new("post")
        .with_base(fixture.blog.clone())
        .with_acl("ALLOW TENANT:acme&GROUP:editors publish");

    let editor = Context::new().with("user", User::new("eve").with_groups(["editors"]));
    assert_eq!(
        manager.can("post.publish", &post, &editor).unwrap(),
        Decision::Allow
    );

    let other_tenant = editor.clone().with("tenant", "globex");
    assert_eq!(
        manager.can("post.publish", &post, &other_tenant).unwrap(),
        Decision::Undetermined
    );
}
