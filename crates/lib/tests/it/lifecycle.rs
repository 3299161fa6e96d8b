//! Present/absent lifecycle: cascading state changes and deletion.

use garrison::model::Presence;

use crate::helpers;

#[test]
fn marking_a_user_absent_flips_every_reference() {
    let admin = helpers::admin();
    let mut kernel = helpers::loaded_kernel();

    kernel
        .set_user_state(&admin, "bob", Presence::Absent)
        .unwrap();

    let web = kernel
        .hosts()
        .find(&admin, "web1.example.com", "default")
        .unwrap()
        .unwrap();

    // bob's account goes absent, the record survives for export
    assert_eq!(web.find_account("bob").unwrap().state(), Presence::Absent);
    // the key grant bob holds on alice's account flips too
    assert_eq!(
        web.find_account("alice").unwrap().find_key("bob").unwrap().state,
        Presence::Absent
    );
    // the wheel binding bob belonged to goes absent with him
    assert_eq!(web.find_binding("wheel").unwrap().state(), Presence::Absent);
    // and his sudo grant
    let principal = web.sudo_entries()[0]
        .user_list()
        .iter()
        .find(|p| !p.is_group() && p.name() == "bob")
        .unwrap();
    assert_eq!(principal.state(), Presence::Absent);

    // unrelated entities are untouched
    assert_eq!(
        web.find_account("alice").unwrap().state(),
        Presence::Present
    );
    let db = kernel
        .hosts()
        .find(&admin, "db1.example.com", "staging")
        .unwrap()
        .unwrap();
    assert_eq!(db.find_account("carol").unwrap().state(), Presence::Present);
}

#[test]
fn state_change_to_the_same_value_is_a_no_op() {
    let admin = helpers::admin();
    let mut kernel = helpers::loaded_kernel();
    assert!(
        kernel
            .set_user_state(&admin, "bob", Presence::Absent)
            .unwrap()
    );
    assert!(
        !kernel
            .set_user_state(&admin, "bob", Presence::Absent)
            .unwrap()
    );
}

#[test]
fn marking_a_group_absent_flips_bindings_and_sudo() {
    let admin = helpers::admin();
    let mut kernel = helpers::loaded_kernel();

    kernel
        .set_group_state(&admin, "wheel", Presence::Absent)
        .unwrap();

    let web = kernel
        .hosts()
        .find(&admin, "web1.example.com", "default")
        .unwrap()
        .unwrap();
    assert_eq!(web.find_binding("wheel").unwrap().state(), Presence::Absent);
    let principal = web.sudo_entries()[0]
        .user_list()
        .iter()
        .find(|p| p.is_group() && p.name() == "wheel")
        .unwrap();
    assert_eq!(principal.state(), Presence::Absent);
}

#[test]
fn deletion_is_refused_while_present_references_remain() {
    let admin = helpers::admin();
    let mut kernel = helpers::loaded_kernel();

    let err = kernel.delete_user(&admin, "bob").unwrap_err();
    assert!(err.is_still_referenced());
    assert!(err.to_string().contains("web1.example.com"));

    // the refusal changed nothing
    assert!(kernel.users().find(&admin, "bob").unwrap().is_some());
}

#[test]
fn deletion_succeeds_after_the_cascade_and_purges_everywhere() {
    let admin = helpers::admin();
    let mut kernel = helpers::loaded_kernel();

    kernel
        .set_user_state(&admin, "bob", Presence::Absent)
        .unwrap();
    kernel.delete_user(&admin, "bob").unwrap();

    assert!(kernel.users().find(&admin, "bob").unwrap().is_none());
    let web = kernel
        .hosts()
        .find(&admin, "web1.example.com", "default")
        .unwrap()
        .unwrap();
    assert!(web.find_account("bob").is_none());
    assert!(web.find_account("alice").unwrap().find_key("bob").is_none());
    assert!(!web.find_binding("wheel").unwrap().has_member("bob"));
    assert!(
        !web.sudo_entries()[0]
            .user_list()
            .iter()
            .any(|p| !p.is_group() && p.name() == "bob")
    );
}

#[test]
fn deleting_a_group_removes_its_bindings() {
    let admin = helpers::admin();
    let mut kernel = helpers::loaded_kernel();

    kernel
        .set_group_state(&admin, "wheel", Presence::Absent)
        .unwrap();
    kernel.delete_group(&admin, "wheel").unwrap();

    let web = kernel
        .hosts()
        .find(&admin, "web1.example.com", "default")
        .unwrap()
        .unwrap();
    assert!(web.find_binding("wheel").is_none());
    assert!(
        !web.sudo_entries()[0]
            .user_list()
            .iter()
            .any(|p| p.is_group() && p.name() == "wheel")
    );
    // the ops binding from the category include survives
    assert!(web.find_binding("ops").is_some());
}

#[test]
fn deleted_users_vanish_from_category_templates() {
    let admin = helpers::admin();
    let mut kernel = helpers::loaded_kernel();

    kernel
        .set_user_state(&admin, "carol", Presence::Absent)
        .unwrap();
    kernel.delete_user(&admin, "carol").unwrap();

    let category = kernel
        .user_categories()
        .find(&admin, "developers")
        .unwrap()
        .unwrap();
    assert!(category.accounts().iter().all(|a| a.user() != "carol"));
    let ops = kernel
        .group_categories()
        .find(&admin, "operators")
        .unwrap()
        .unwrap();
    assert!(ops.bindings().iter().all(|b| !b.has_member("carol")));
}
