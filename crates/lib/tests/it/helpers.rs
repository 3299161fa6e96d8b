//! Shared fixtures for the integration suite.

use garrison::perms::Identity;
use garrison::records::{
    AuthorizedKeyRecord, GroupBindingRecord, GroupCategoryRecord, GroupManagerRecord,
    GroupRecord, HostRecord, IncludesRecord, NameRef, RecordSet, SudoEntryRecord,
    UserAccountRecord, UserCategoryRecord, UserManagerRecord, UserRecord,
};
use garrison::registry::Kernel;

pub fn admin() -> Identity {
    Identity::admin("root")
}

pub fn user_record(name: &str, uid: Option<u32>) -> UserRecord {
    UserRecord {
        name: Some(name.to_string()),
        uid,
        ..Default::default()
    }
}

pub fn group_record(name: &str, gid: Option<u32>) -> GroupRecord {
    GroupRecord {
        name: Some(name.to_string()),
        gid,
        ..Default::default()
    }
}

pub fn account(user: &str, grantees: &[&str]) -> UserAccountRecord {
    UserAccountRecord {
        user: NameRef::named(user),
        authorized_keys: grantees
            .iter()
            .map(|g| AuthorizedKeyRecord {
                user: NameRef::named(*g),
                state: None,
            })
            .collect(),
        state: None,
    }
}

pub fn binding(group: &str, members: &[&str]) -> GroupBindingRecord {
    GroupBindingRecord {
        group: NameRef::named(group),
        members: members.iter().map(|m| m.to_string()).collect(),
        state: None,
    }
}

pub fn sudo_entry(users: &[&str], groups: &[&str], commands: &[&str]) -> SudoEntryRecord {
    let mut user_list = Vec::new();
    for user in users {
        user_list.push(garrison::records::SudoPrincipalRecord {
            user: Some(NameRef::named(*user)),
            group: None,
        });
    }
    for group in groups {
        user_list.push(garrison::records::SudoPrincipalRecord {
            user: None,
            group: Some(NameRef::named(*group)),
        });
    }
    SudoEntryRecord {
        name: None,
        user_list,
        command_spec: Some(garrison::records::CommandSpecRecord {
            run_as: Some("root".to_string()),
            options: Some("NOPASSWD:".to_string()),
            cmd_list: commands.iter().map(|c| c.to_string()).collect(),
        }),
    }
}

/// A small but complete fleet: three users, two groups, one category of
/// each kind, two hosts.
pub fn fleet_records() -> RecordSet {
    let mut web = HostRecord {
        name: Some("web1.example.com".to_string()),
        ..Default::default()
    };
    web.users = vec![account("alice", &["bob"]), account("bob", &[])];
    web.groups = vec![binding("wheel", &["bob"])];
    web.sudo_entries = vec![sudo_entry(&["bob"], &["wheel"], &["/bin/systemctl"])];
    web.includes = Some(IncludesRecord {
        user_categories: vec!["developers".to_string()],
        group_categories: vec!["operators".to_string()],
    });

    let db = HostRecord {
        name: Some("db1.example.com".to_string()),
        config_group: Some("staging".to_string()),
        users: vec![account("carol", &[])],
        ..Default::default()
    };

    RecordSet {
        users: Some(UserManagerRecord {
            users: vec![
                user_record("alice", Some(1000)),
                user_record("bob", Some(1001)),
                user_record("carol", Some(1002)),
            ],
            ..Default::default()
        }),
        groups: Some(GroupManagerRecord {
            groups: vec![group_record("wheel", Some(10)), group_record("ops", Some(11))],
            ..Default::default()
        }),
        user_categories: vec![UserCategoryRecord {
            name: Some("developers".to_string()),
            config: vec![account("carol", &["alice"])],
        }],
        group_categories: vec![GroupCategoryRecord {
            name: Some("operators".to_string()),
            config: vec![binding("ops", &["alice", "carol"])],
        }],
        hosts: vec![web, db],
    }
}

pub fn loaded_kernel() -> Kernel {
    let admin = admin();
    let mut kernel = Kernel::new(&admin).expect("kernel construction");
    let report = kernel
        .load_all(&admin, &fleet_records())
        .expect("fleet loads");
    assert!(report.errors.is_empty(), "fleet fixture loads cleanly");
    kernel
}
