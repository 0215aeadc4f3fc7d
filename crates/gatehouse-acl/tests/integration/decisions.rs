//! Decisions over literal ACL sources.

use gatehouse_acl::{
    AceEntry, Acl, AclChunk, AclSource, Context, Decision, Error, PermissionSet, Registry,
    check, decide, parse_acl, resolve_state,
};
use serde_json::json;

use crate::common::{ADMIN_ONLY, anonymous_context, root_context, user_context};

fn run(source: impl Into<AclSource>, permission: &str, context: &Context) -> Decision {
    decide(permission, &source.into(), &Registry::with_defaults(), context)
        .expect("decision should succeed")
}

#[test]
fn test_state_resolution() {
    assert!(resolve_state(&json!(true)).unwrap());
    assert!(resolve_state(&json!("Allow")).unwrap());
    assert!(!resolve_state(&json!("REJECT")).unwrap());
    assert!(matches!(
        resolve_state(&json!("maybe")),
        Err(Error::InvalidStateValue(_))
    ));
    assert!(matches!(
        resolve_state(&json!(42)),
        Err(Error::InvalidStateType(_))
    ));
}

#[test]
fn test_comment_lines_are_ignored() {
    let source = AclSource::from("ALLOW WHEEL ALL\n# comment\nDENY ANY ALL");
    let registry = Registry::with_defaults();
    let aces: Vec<_> = parse_acl(&source, &registry)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(aces.len(), 2);
    assert!(aces[0].state);
    assert_eq!(aces[0].predicate.label(), "WHEEL");
    assert!(!aces[1].state);
    assert_eq!(aces[1].predicate.label(), "ANY");
}

#[test]
fn test_two_field_line_is_rejected() {
    let err = decide(
        "x",
        &"ALLOW X".into(),
        &Registry::with_defaults(),
        &Context::new(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::MalformedAce { fields: 2, .. }));
}

#[test]
fn test_admin_only_policy() {
    assert_eq!(run(ADMIN_ONLY, "anything", &root_context()), Decision::Allow);
    assert_eq!(
        run(ADMIN_ONLY, "anything", &user_context("alice", &["staff"])),
        Decision::Deny
    );
}

#[test]
fn test_swapping_lines_changes_outcome() {
    let swapped = "DENY ANY ALL\nALLOW WHEEL ALL";
    assert_eq!(run(swapped, "anything", &root_context()), Decision::Deny);
}

#[test]
fn test_empty_acl_is_undetermined_not_deny() {
    let decision = run(AclSource::new(), "anything", &root_context());
    assert_eq!(decision, Decision::Undetermined);
    assert_ne!(decision, Decision::Deny);
    assert_eq!(decision.state(), None);
}

#[test]
fn test_literal_permission_is_exact() {
    let entry = AceEntry::new(true, "ANY", "read");
    assert_eq!(run(entry.clone(), "read", &Context::new()), Decision::Allow);
    assert_eq!(
        run(entry, "read.extended", &Context::new()),
        Decision::Undetermined
    );

    // The same spelling as a token is a lookup, not an equality test.
    let err = decide(
        "read",
        &"ALLOW ANY read".into(),
        &Registry::with_defaults(),
        &Context::new(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::UnknownPermissionSet(_)));
}

#[test]
fn test_text_and_entries_interleave() {
    let source: AclSource = [
        AclChunk::from(AceEntry::new("deny", "ANONYMOUS", json!(["doc.edit", "doc.delete"]))),
        AclChunk::from("ALLOW AUTHENTICATED doc.*"),
        AclChunk::from(AceEntry::with_set(true, "ANY", PermissionSet::All)),
    ]
    .into_iter()
    .collect();

    assert_eq!(run(source.clone(), "doc.edit", &anonymous_context()), Decision::Deny);
    assert_eq!(run(source.clone(), "doc.view", &anonymous_context()), Decision::Allow);
    assert_eq!(
        run(source, "doc.edit", &user_context("bob", &[])),
        Decision::Allow
    );
}

#[test]
fn test_http_method_sets() {
    let acl = "ALLOW ANY http.read\nDENY ANONYMOUS http.write\nALLOW AUTHENTICATED http.write";
    assert_eq!(run(acl, "http.head", &anonymous_context()), Decision::Allow);
    assert_eq!(run(acl, "http.put", &anonymous_context()), Decision::Deny);
    assert_eq!(run(acl, "http.put", &user_context("bob", &[])), Decision::Allow);
    assert_eq!(
        run(acl, "http.trace", &user_context("bob", &[])),
        Decision::Undetermined
    );
}

#[test]
fn test_custom_registry_names() {
    let mut registry = Registry::with_defaults();
    registry
        .register_predicate("BUSINESS_HOURS", |ctx: &Context| -> gatehouse_acl::Result<bool> {
            let hour = ctx
                .require("BUSINESS_HOURS", "hour")?
                .as_u64()
                .ok_or_else(|| Error::invalid_context("hour", "expected an integer"))?;
            Ok((9..17).contains(&hour))
        })
        .register_permission_set("payroll", PermissionSet::members(["payroll.run"]));

    let acl = Acl::parse(
        &"ALLOW BUSINESS_HOURS&GROUP:finance payroll\nDENY ANY payroll".into(),
        &registry,
    )
    .unwrap();

    let mut ctx = user_context("fran", &["finance"]);
    ctx.insert("hour", 10);
    assert_eq!(check("payroll.run", &acl, &ctx).unwrap(), Decision::Allow);

    ctx.insert("hour", 20);
    assert_eq!(check("payroll.run", &acl, &ctx).unwrap(), Decision::Deny);

    ctx.insert("hour", "late");
    assert!(matches!(
        check("payroll.run", &acl, &ctx),
        Err(Error::InvalidContext { .. })
    ));
}

#[test]
fn test_missing_required_context_is_an_error() {
    let err = decide(
        "x",
        &ADMIN_ONLY.into(),
        &Registry::with_defaults(),
        &Context::new(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::MissingContext { ref key, .. } if key == "user"));
    assert!(!err.is_parse_error());
}
