//! Bulk loading: partial failure, category expansion, dependency order.

use garrison::records::{HostRecord, IncludesRecord};
use garrison::registry::{Kernel, ManagerKind};

use crate::helpers;

#[test]
fn one_nameless_host_record_costs_one_host() {
    let admin = helpers::admin();
    let mut kernel = Kernel::new(&admin).unwrap();
    let mut records = helpers::fleet_records();
    records.hosts = vec![
        HostRecord {
            name: Some("a.example.com".to_string()),
            ..Default::default()
        },
        HostRecord::default(),
        HostRecord {
            name: Some("b.example.com".to_string()),
            ..Default::default()
        },
        HostRecord {
            name: Some("c.example.com".to_string()),
            ..Default::default()
        },
    ];

    let report = kernel.load_all(&admin, &records).unwrap();
    assert_eq!(report.hosts, 3);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(kernel.hosts().hosts(&admin).unwrap().len(), 3);
}

#[test]
fn bad_user_records_do_not_stop_the_user_load() {
    let admin = helpers::admin();
    let mut kernel = Kernel::new(&admin).unwrap();
    let mut records = helpers::fleet_records();
    let users = records.users.as_mut().unwrap();
    // same uid as alice
    users.users.push(helpers::user_record("dave", Some(1000)));
    // unparseable state
    let mut eve = helpers::user_record("eve", None);
    eve.state = Some("gone".to_string());
    users.users.push(eve);

    let report = kernel.load_all(&admin, &records).unwrap();
    assert_eq!(report.users, 3);
    assert_eq!(report.errors.len(), 2);
    assert!(kernel.users().find(&admin, "dave").unwrap().is_none());
    assert!(kernel.users().find(&admin, "carol").unwrap().is_some());
}

#[test]
fn category_expansion_merges_without_duplicates() {
    let admin = helpers::admin();
    let kernel = helpers::loaded_kernel();

    let web = kernel
        .hosts()
        .find(&admin, "web1.example.com", "default")
        .unwrap()
        .unwrap();

    // direct accounts: alice, bob; the developers category adds carol.
    // nothing is listed twice.
    assert_eq!(web.user_accounts().len(), 3);
    assert!(web.find_account("carol").unwrap().find_key("alice").is_some());

    // the operators category adds the ops binding alongside the direct
    // wheel binding
    assert_eq!(web.group_bindings().len(), 2);
    let ops = web.find_binding("ops").unwrap();
    assert!(ops.has_member("alice"));
    assert!(ops.has_member("carol"));
}

#[test]
fn direct_bindings_and_category_templates_union_members() {
    let admin = helpers::admin();
    let mut kernel = Kernel::new(&admin).unwrap();
    let mut records = helpers::fleet_records();
    // give the host a direct ops binding; the operators category then
    // merges its own members into it
    records.hosts[0]
        .groups
        .push(helpers::binding("ops", &["bob"]));
    kernel.load_all(&admin, &records).unwrap();

    let web = kernel
        .hosts()
        .find(&admin, "web1.example.com", "default")
        .unwrap()
        .unwrap();
    let ops = web.find_binding("ops").unwrap();
    assert_eq!(web.group_bindings().len(), 2);
    for member in ["alice", "bob", "carol"] {
        assert!(ops.has_member(member), "{member} should be in ops");
    }
}

#[test]
fn unknown_references_are_ledgered_per_host() {
    let admin = helpers::admin();
    let mut kernel = Kernel::new(&admin).unwrap();
    let mut records = helpers::fleet_records();
    records.hosts[1].users.push(helpers::account("ghost", &[]));
    records.hosts[1].includes = Some(IncludesRecord {
        user_categories: vec!["nosuch".to_string()],
        group_categories: vec![],
    });

    let report = kernel.load_all(&admin, &records).unwrap();
    assert_eq!(report.hosts, 2);
    assert_eq!(report.errors.len(), 2);

    // the ledger travels with the host
    let ledger = kernel.hosts().ledger("db1.example.com", "staging").unwrap();
    assert_eq!(ledger.len(), 2);
    let clean = kernel.hosts().ledger("web1.example.com", "default").unwrap();
    assert!(clean.is_empty());
}

#[test]
fn managers_load_in_dependency_order() {
    let admin = helpers::admin();
    let kernel = Kernel::new(&admin).unwrap();
    let order = kernel.order();
    let position = |kind: ManagerKind| order.iter().position(|&k| k == kind).unwrap();
    for kind in [
        ManagerKind::Groups,
        ManagerKind::Sudo,
        ManagerKind::UserCategories,
        ManagerKind::GroupCategories,
        ManagerKind::Hosts,
    ] {
        for dep in kind.dependencies() {
            assert!(position(*dep) < position(kind));
        }
    }
}

#[test]
fn sudo_rules_render_as_sudoers_lines() {
    let admin = helpers::admin();
    let kernel = helpers::loaded_kernel();
    let web = kernel
        .hosts()
        .find(&admin, "web1.example.com", "default")
        .unwrap()
        .unwrap();
    assert_eq!(
        web.sudo_entries()[0].render(),
        "bob,%wheel ALL = (root) NOPASSWD: /bin/systemctl"
    );
}
