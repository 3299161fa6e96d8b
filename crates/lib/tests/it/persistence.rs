//! File store round trips through the kernel.

use garrison::constants::ARCHIVE_DIR;
use garrison::model::Presence;
use garrison::registry::Kernel;
use garrison::store::FileStore;
use tempfile::TempDir;

use crate::helpers;

#[test]
fn full_round_trip_through_the_store() {
    let admin = helpers::admin();
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());

    // first generation: write the fixture set directly
    store.save_all(&helpers::fleet_records()).unwrap();

    // load it back through a kernel
    let (records, warnings) = store.load();
    assert!(warnings.is_empty());
    let mut kernel = Kernel::new(&admin).unwrap();
    let report = kernel.load_all(&admin, &records).unwrap();
    assert!(report.errors.is_empty());
    assert_eq!(report.hosts, 2);

    // mutate, export, save: the change survives a reload
    kernel
        .set_user_state(&admin, "bob", Presence::Absent)
        .unwrap();
    let exported = kernel.export_all(&admin).unwrap();
    store.save_all(&exported).unwrap();

    let (records, _) = store.load();
    let mut reloaded = Kernel::new(&admin).unwrap();
    reloaded.load_all(&admin, &records).unwrap();
    assert_eq!(
        reloaded
            .users()
            .find(&admin, "bob")
            .unwrap()
            .unwrap()
            .state(),
        Presence::Absent
    );
    let web = reloaded
        .hosts()
        .find(&admin, "web1.example.com", "default")
        .unwrap()
        .unwrap();
    assert_eq!(web.find_account("bob").unwrap().state(), Presence::Absent);

    // the first generation was archived, not clobbered
    let archive = dir.path().join(ARCHIVE_DIR);
    assert_eq!(std::fs::read_dir(&archive).unwrap().count(), 1);
}

#[test]
fn hosts_keep_their_config_group_directories() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());
    store.save_all(&helpers::fleet_records()).unwrap();

    assert!(
        dir.path()
            .join("configs/default/web1.example.com.json")
            .exists()
    );
    assert!(
        dir.path()
            .join("configs/staging/db1.example.com.json")
            .exists()
    );
}

#[test]
fn permissions_serialize_as_octal_strings() {
    let admin = helpers::admin();
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());

    let mut kernel = Kernel::new(&admin).unwrap();
    kernel
        .load_all(&admin, &helpers::fleet_records())
        .unwrap();
    store.save_all(&kernel.export_all(&admin).unwrap()).unwrap();

    let text =
        std::fs::read_to_string(dir.path().join("configs/default/web1.example.com.json")).unwrap();
    assert!(text.contains(r#""permissions": "760""#));
    let users = std::fs::read_to_string(dir.path().join("users.json")).unwrap();
    assert!(users.contains(r#""permissions": "660""#));
}
