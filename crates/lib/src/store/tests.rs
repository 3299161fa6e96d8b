use std::fs;

use tempfile::TempDir;

use super::*;
use crate::records::{GroupRecord, UserRecord};

fn sample_set() -> RecordSet {
    RecordSet {
        users: Some(UserManagerRecord {
            users: vec![UserRecord {
                name: Some("alice".to_string()),
                uid: Some(1000),
                ..Default::default()
            }],
            ..Default::default()
        }),
        groups: Some(GroupManagerRecord {
            groups: vec![GroupRecord {
                name: Some("wheel".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }),
        user_categories: vec![],
        group_categories: vec![],
        hosts: vec![HostRecord {
            name: Some("web1.example.com".to_string()),
            config_group: Some("default".to_string()),
            ..Default::default()
        }],
    }
}

#[test]
fn empty_root_loads_as_empty_with_warnings() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());
    let (records, warnings) = store.load();

    assert!(records.users.is_none());
    assert!(records.groups.is_none());
    assert!(records.hosts.is_empty());
    assert!(warnings.iter().any(|w| w.contains(USERS_FILE)));
}

#[test]
fn save_then_load_round_trips() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());
    let results = store.save_all(&sample_set()).unwrap();
    assert!(results.iter().any(|r| r.contains(USERS_FILE)));
    assert!(
        results
            .iter()
            .any(|r| r.contains("configs/default/web1.example.com.json"))
    );

    let (records, _) = store.load();
    assert_eq!(records.users.unwrap().users[0].name.as_deref(), Some("alice"));
    assert_eq!(records.groups.unwrap().groups[0].name.as_deref(), Some("wheel"));
    assert_eq!(records.hosts.len(), 1);
    assert_eq!(records.hosts[0].name.as_deref(), Some("web1.example.com"));
}

#[test]
fn saving_archives_the_previous_generation() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());
    store.save_all(&sample_set()).unwrap();
    store.save_all(&sample_set()).unwrap();

    let archive = dir.path().join(ARCHIVE_DIR);
    let generations: Vec<_> = fs::read_dir(&archive).unwrap().collect();
    assert_eq!(generations.len(), 1);
    let generation = generations[0].as_ref().unwrap().path();
    assert!(generation.join(USERS_FILE).exists());
    assert!(generation.join(CONFIGS_DIR).exists());

    // the live generation is rewritten in place
    assert!(dir.path().join(USERS_FILE).exists());
}

#[test]
fn host_records_inherit_the_directory_config_group() {
    let dir = TempDir::new().unwrap();
    let configs = dir.path().join(CONFIGS_DIR).join("staging");
    fs::create_dir_all(&configs).unwrap();
    fs::write(
        configs.join("db1.example.com.json"),
        r#"{"name": "db1.example.com"}"#,
    )
    .unwrap();

    let store = FileStore::new(dir.path());
    let (records, _) = store.load();
    assert_eq!(records.hosts.len(), 1);
    assert_eq!(records.hosts[0].config_group.as_deref(), Some("staging"));
}

#[test]
fn malformed_files_are_warnings_not_errors() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(USERS_FILE), "{not json").unwrap();

    let store = FileStore::new(dir.path());
    let (records, warnings) = store.load();
    assert!(records.users.is_none());
    assert!(
        warnings
            .iter()
            .any(|w| w.contains("could not parse") && w.contains(USERS_FILE))
    );
}
