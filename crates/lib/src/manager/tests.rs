use super::*;
use crate::model::{
    CommandSpec, Group, Host, HostGroupBinding, HostUserAccount, Presence, SudoEntry,
    SudoPrincipal, User,
};
use crate::model::AuthorizedKey;
use crate::perms::{Identity, Mode};
use crate::resolve::{Issue, Ledger};

fn admin() -> Identity {
    Identity::admin("root")
}

fn user_manager_with(names: &[&str]) -> UserManager {
    let mut manager = UserManager::new(&admin());
    for name in names {
        manager.insert(User::new(*name).unwrap()).unwrap();
    }
    manager
}

fn group_manager_with(names: &[&str]) -> GroupManager {
    let mut manager = GroupManager::new(&admin());
    for name in names {
        manager.insert(Group::new(*name).unwrap()).unwrap();
    }
    manager
}

fn bare_host() -> Host {
    Host::new(
        "web1.example.com",
        "default",
        "root",
        "root",
        Mode::from_bits(0o760).unwrap(),
    )
    .unwrap()
}

#[test]
fn duplicate_user_name_rejected_before_uid() {
    let mut manager = UserManager::new(&admin());
    manager
        .insert(User::with_details("alice", Some(1000), None, Presence::Present).unwrap())
        .unwrap();

    // same name AND same uid: the name collision wins
    let err = manager
        .insert(User::with_details("alice", Some(1000), None, Presence::Present).unwrap())
        .unwrap_err();
    assert!(matches!(err, ManagerError::DuplicateName { .. }));

    let err = manager
        .insert(User::with_details("bob", Some(1000), None, Presence::Present).unwrap())
        .unwrap_err();
    assert!(matches!(err, ManagerError::DuplicateId { id: 1000, .. }));

    // a rejected insert leaves the collection untouched
    assert_eq!(manager.len(), 1);
}

#[test]
fn duplicate_gid_rejected() {
    let mut manager = GroupManager::new(&admin());
    manager
        .insert(Group::with_details("wheel", Some(10), Presence::Present).unwrap())
        .unwrap();
    let err = manager
        .insert(Group::with_details("ops", Some(10), Presence::Present).unwrap())
        .unwrap_err();
    assert!(err.is_conflict());
}

#[test]
fn users_without_uid_never_collide() {
    let mut manager = UserManager::new(&admin());
    manager.insert(User::new("alice").unwrap()).unwrap();
    manager.insert(User::new("bob").unwrap()).unwrap();
    assert_eq!(manager.len(), 2);
}

#[test]
fn manager_guard_denies_strangers() {
    let mut manager = UserManager::new(&Identity::admin("victor"));
    let stranger = Identity::new("mallory", vec![], "mallory");

    let err = manager
        .add(&stranger, User::new("alice").unwrap())
        .unwrap_err();
    assert!(err.is_permission_denied());

    let err = manager.find(&stranger, "alice").unwrap_err();
    assert!(err.is_permission_denied());
}

#[test]
fn manager_guard_allows_group_readers() {
    let owner = Identity::new("victor", vec![], "staff");
    let mut manager = UserManager::new(&owner);
    manager.insert(User::new("alice").unwrap()).unwrap();

    // default mode 660: group members may read and write
    let colleague = Identity::new("carol", vec!["staff".to_string()], "carol");
    assert!(manager.find(&colleague, "alice").unwrap().is_some());

    let stranger = Identity::new("mallory", vec![], "mallory");
    assert!(manager.find(&stranger, "alice").is_err());
}

#[test]
fn attach_account_requires_valid_user() {
    let users = user_manager_with(&["alice"]);
    let mut host = bare_host();
    let mut ledger = Ledger::new();

    let err = users
        .attach_account(
            &mut host,
            HostUserAccount::new("ghost").unwrap(),
            &mut ledger,
        )
        .unwrap_err();
    assert!(matches!(err, ManagerError::UnknownUser { .. }));
    assert!(host.user_accounts().is_empty());
}

#[test]
fn attach_account_ledgers_unknown_grantees() {
    let users = user_manager_with(&["alice", "bob"]);
    let mut host = bare_host();
    let mut ledger = Ledger::new();

    let mut account = HostUserAccount::new("alice").unwrap();
    account.grant_key(AuthorizedKey::new("bob"));
    account.grant_key(AuthorizedKey::new("ghost"));
    users.attach_account(&mut host, account, &mut ledger).unwrap();

    let attached = host.find_account("alice").unwrap();
    assert!(attached.find_key("bob").is_some());
    assert!(attached.find_key("ghost").is_none());
    assert_eq!(ledger.len(), 1);
    assert!(matches!(
        ledger.iter().next().unwrap(),
        Issue::UnresolvedUser { name, .. } if name == "ghost"
    ));
}

#[test]
fn attach_account_merges_duplicates() {
    let users = user_manager_with(&["alice", "bob", "carol"]);
    let mut host = bare_host();
    let mut ledger = Ledger::new();

    let mut first = HostUserAccount::new("alice").unwrap();
    first.grant_key(AuthorizedKey::new("bob"));
    users.attach_account(&mut host, first, &mut ledger).unwrap();

    let mut second = HostUserAccount::new("alice").unwrap();
    second.grant_key(AuthorizedKey::new("carol"));
    users.attach_account(&mut host, second, &mut ledger).unwrap();

    assert_eq!(host.user_accounts().len(), 1);
    let merged = host.find_account("alice").unwrap();
    assert!(merged.find_key("bob").is_some());
    assert!(merged.find_key("carol").is_some());
    assert!(ledger.is_empty());
}

#[test]
fn attach_binding_drops_unknown_members() {
    let users = user_manager_with(&["alice"]);
    let groups = group_manager_with(&["wheel"]);
    let mut host = bare_host();
    let mut ledger = Ledger::new();

    let mut binding = HostGroupBinding::new("wheel").unwrap();
    binding.add_member("alice");
    binding.add_member("ghost");
    groups
        .attach_binding(&users, &mut host, binding, &mut ledger)
        .unwrap();

    let attached = host.find_binding("wheel").unwrap();
    assert_eq!(attached.members(), ["alice"]);
    assert_eq!(ledger.len(), 1);
}

#[test]
fn attach_binding_requires_valid_group() {
    let users = user_manager_with(&[]);
    let groups = group_manager_with(&[]);
    let mut host = bare_host();
    let mut ledger = Ledger::new();

    let err = groups
        .attach_binding(
            &users,
            &mut host,
            HostGroupBinding::new("ghosts").unwrap(),
            &mut ledger,
        )
        .unwrap_err();
    assert!(matches!(err, ManagerError::UnknownGroup { .. }));
}

#[test]
fn attach_sudo_entry_vets_principals() {
    let users = user_manager_with(&["deploy"]);
    let groups = group_manager_with(&["wheel"]);
    let sudo = SudoManager::new(&admin());
    let mut host = bare_host();
    let mut ledger = Ledger::new();

    let mut entry = SudoEntry::new(CommandSpec {
        run_as: "root".to_string(),
        options: "NOPASSWD:".to_string(),
        cmd_list: vec!["/bin/systemctl".to_string()],
    })
    .unwrap();
    entry.add_principal(SudoPrincipal::user("deploy"));
    entry.add_principal(SudoPrincipal::user("ghost"));
    entry.add_principal(SudoPrincipal::group("wheel"));
    entry.add_principal(SudoPrincipal::group("phantoms"));

    sudo.attach_entry(&users, &groups, &mut host, entry, &mut ledger);

    let attached = &host.sudo_entries()[0];
    assert_eq!(attached.user_list().len(), 2);
    assert_eq!(ledger.len(), 2);
}

#[test]
fn named_sudo_entries_require_a_name() {
    let mut sudo = SudoManager::new(&admin());
    let entry = SudoEntry::new(CommandSpec {
        run_as: "root".to_string(),
        options: String::new(),
        cmd_list: vec!["/bin/true".to_string()],
    })
    .unwrap();
    assert!(matches!(
        sudo.insert(entry),
        Err(ManagerError::UnnamedSudoEntry)
    ));
}

#[test]
fn host_manager_flips_user_references() {
    let users = user_manager_with(&["alice", "bob"]);
    let groups = group_manager_with(&["wheel"]);
    let mut hosts = HostManager::new(&admin());

    let mut host = bare_host();
    let mut ledger = Ledger::new();
    let mut account = HostUserAccount::new("bob").unwrap();
    account.grant_key(AuthorizedKey::new("alice"));
    users.attach_account(&mut host, account, &mut ledger).unwrap();
    let mut binding = HostGroupBinding::new("wheel").unwrap();
    binding.add_member("bob");
    groups
        .attach_binding(&users, &mut host, binding, &mut ledger)
        .unwrap();
    hosts.insert(ResolvedHost { host, ledger }).unwrap();

    assert!(hosts.user_referenced_present("bob"));
    hosts.on_user_state("bob", Presence::Absent);
    assert!(!hosts.user_referenced_present("bob"));

    let resolved = hosts.get("web1.example.com", "default").unwrap();
    assert_eq!(
        resolved.host.find_account("bob").unwrap().state(),
        Presence::Absent
    );
    // the binding bob belonged to goes absent with him
    assert_eq!(
        resolved.host.find_binding("wheel").unwrap().state(),
        Presence::Absent
    );
    // alice's key grant on bob's account is untouched
    assert!(
        resolved
            .host
            .find_account("bob")
            .unwrap()
            .find_key("alice")
            .unwrap()
            .state
            .is_present()
    );
}

#[test]
fn host_manager_purges_groups() {
    let users = user_manager_with(&["alice"]);
    let groups = group_manager_with(&["wheel"]);
    let mut hosts = HostManager::new(&admin());

    let mut host = bare_host();
    let mut ledger = Ledger::new();
    let binding = HostGroupBinding::new("wheel").unwrap();
    groups
        .attach_binding(&users, &mut host, binding, &mut ledger)
        .unwrap();
    hosts.insert(ResolvedHost { host, ledger }).unwrap();

    hosts.purge_group("wheel");
    let resolved = hosts.get("web1.example.com", "default").unwrap();
    assert!(resolved.host.group_bindings().is_empty());
    assert!(!hosts.group_referenced_present("wheel"));
}

#[test]
fn duplicate_host_key_rejected() {
    let mut hosts = HostManager::new(&admin());
    hosts
        .insert(ResolvedHost {
            host: bare_host(),
            ledger: Ledger::new(),
        })
        .unwrap();
    let err = hosts
        .insert(ResolvedHost {
            host: bare_host(),
            ledger: Ledger::new(),
        })
        .unwrap_err();
    assert!(err.is_conflict());

    // same name under another config group is a different host
    hosts
        .insert(ResolvedHost {
            host: Host::new(
                "web1.example.com",
                "staging",
                "root",
                "root",
                Mode::from_bits(0o760).unwrap(),
            )
            .unwrap(),
            ledger: Ledger::new(),
        })
        .unwrap();
}

#[test]
fn host_listing_filters_by_read_access() {
    let mut hosts = HostManager::new(&Identity::admin("victor"));
    hosts
        .insert(ResolvedHost {
            host: Host::new(
                "open.example.com",
                "default",
                "victor",
                "staff",
                Mode::from_bits(0o764).unwrap(),
            )
            .unwrap(),
            ledger: Ledger::new(),
        })
        .unwrap();
    hosts
        .insert(ResolvedHost {
            host: Host::new(
                "locked.example.com",
                "default",
                "victor",
                "staff",
                Mode::from_bits(0o760).unwrap(),
            )
            .unwrap(),
            ledger: Ledger::new(),
        })
        .unwrap();

    // hosts() is gated by the manager meta too, so use an identity in the
    // owner's primary group
    let reader = Identity::new("carol", vec!["victor".to_string()], "carol");
    let visible = hosts.hosts(&reader).unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].name(), "open.example.com");
}

#[test]
fn category_managers_reject_duplicates() {
    let mut manager = UserCategoryManager::new(&admin());
    manager
        .insert(crate::model::UserCategory::new("developers", vec![]).unwrap())
        .unwrap();
    let err = manager
        .insert(crate::model::UserCategory::new("developers", vec![]).unwrap())
        .unwrap_err();
    assert!(err.is_conflict());
}
