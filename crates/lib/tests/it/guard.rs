//! Permission guard behavior across whole-kernel operations.

use garrison::model::{Presence, User};
use garrison::perms::{Identity, Mode};
use garrison::records::HostRecord;
use garrison::registry::Kernel;

use crate::helpers;

fn owner() -> Identity {
    Identity::new("victor", vec![], "staff")
}

#[test]
fn collection_owner_may_read_and_write() {
    let owner = owner();
    let mut kernel = Kernel::new(&owner).unwrap();
    kernel
        .users_mut()
        .add(&owner, User::new("alice").unwrap())
        .unwrap();
    assert!(kernel.users().find(&owner, "alice").unwrap().is_some());
}

#[test]
fn group_members_use_the_group_nibble() {
    let owner = owner();
    let mut kernel = Kernel::new(&owner).unwrap();
    kernel
        .users_mut()
        .add(&owner, User::new("alice").unwrap())
        .unwrap();

    // manager collections default to mode 660: group rw
    let colleague = Identity::new("carol", vec!["staff".to_string()], "carol");
    assert!(kernel.users().find(&colleague, "alice").unwrap().is_some());
    kernel
        .users_mut()
        .add(&colleague, User::new("bob").unwrap())
        .unwrap();
}

#[test]
fn strangers_are_denied_with_the_full_story() {
    let owner = owner();
    let kernel = Kernel::new(&owner).unwrap();
    let stranger = Identity::new("mallory", vec![], "mallory");

    let err = kernel.users().find(&stranger, "alice").unwrap_err();
    assert!(err.is_permission_denied());
    assert_eq!(
        err.to_string(),
        "user 'mallory' does not have the required permissions for user manager \
         for the action 'read'"
    );
}

#[test]
fn admin_bypasses_every_check() {
    let owner = owner();
    let mut kernel = Kernel::new(&owner).unwrap();
    let admin = Identity::admin("root");
    kernel
        .users_mut()
        .add(&admin, User::new("alice").unwrap())
        .unwrap();
    kernel
        .set_user_state(&admin, "alice", Presence::Absent)
        .unwrap();
    assert!(kernel.users().find(&admin, "alice").unwrap().is_some());
}

#[test]
fn host_reads_check_the_host_mode_too() {
    let admin = helpers::admin();
    let mut kernel = Kernel::new(&admin).unwrap();
    let record = HostRecord {
        name: Some("web1.example.com".to_string()),
        owner: Some("victor".to_string()),
        group: Some("staff".to_string()),
        permissions: Some(garrison::records::ModeSpec::Text("740".to_string())),
        ..Default::default()
    };
    kernel.add_host(&admin, &record).unwrap();

    // the host manager's collection is owned by root (admin constructor),
    // so give readers the manager group before testing host-level modes
    let colleague = Identity::new("carol", vec!["staff".to_string(), "root".to_string()], "carol");
    assert!(
        kernel
            .hosts()
            .find(&colleague, "web1.example.com", "default")
            .unwrap()
            .is_some()
    );

    let outsider = Identity::new("mallory", vec!["root".to_string()], "mallory");
    let err = kernel
        .hosts()
        .find(&outsider, "web1.example.com", "default")
        .unwrap_err();
    assert!(err.is_permission_denied());
    assert!(err.to_string().contains("host 'web1.example.com'"));
}

#[test]
fn mode_round_trips_between_forms() {
    for bits in 0..=0o777u16 {
        let mode = Mode::from_bits(bits).unwrap();
        assert_eq!(Mode::parse(&mode.octal_string()).unwrap(), mode);
        assert_eq!(Mode::parse(&mode.triad()).unwrap(), mode);
    }
}
