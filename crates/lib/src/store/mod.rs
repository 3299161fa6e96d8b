//! File datastore.
//!
//! The store is a dumb collaborator at the boundary: it shuttles record
//! structs between the db directory and the kernel and knows nothing about
//! validation or resolution. Layout:
//!
//! ```text
//! <db>/users.json
//! <db>/groups.json
//! <db>/includes/user-categories.json
//! <db>/includes/group-categories.json
//! <db>/configs/<config group>/<host>.json
//! <db>/archive/<timestamp>/...
//! ```
//!
//! Missing files are warnings, never errors: a fresh db directory loads as
//! an empty record set.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::constants::{
    ARCHIVE_DIR, CONFIGS_DIR, DEFAULT_CONFIG_GROUP, GROUPS_FILE, GROUP_CATEGORIES_FILE,
    USERS_FILE, USER_CATEGORIES_FILE,
};
use crate::records::{
    GroupCategoryRecord, GroupManagerRecord, HostRecord, RecordSet, UserCategoryRecord,
    UserManagerRecord,
};

pub mod errors;

#[cfg(test)]
mod tests;

pub use errors::StoreError;

/// A datastore rooted at one db directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load every record file under the root. Missing or malformed files
    /// are reported in the warning list and the rest of the set still
    /// loads.
    pub fn load(&self) -> (RecordSet, Vec<String>) {
        let mut warnings = Vec::new();
        let records = RecordSet {
            users: self.read_json::<UserManagerRecord>(USERS_FILE, &mut warnings),
            groups: self.read_json::<GroupManagerRecord>(GROUPS_FILE, &mut warnings),
            user_categories: self
                .read_json::<Vec<UserCategoryRecord>>(USER_CATEGORIES_FILE, &mut warnings)
                .unwrap_or_default(),
            group_categories: self
                .read_json::<Vec<GroupCategoryRecord>>(GROUP_CATEGORIES_FILE, &mut warnings)
                .unwrap_or_default(),
            hosts: self.load_hosts(&mut warnings),
        };
        (records, warnings)
    }

    fn read_json<T: DeserializeOwned>(&self, rel: &str, warnings: &mut Vec<String>) -> Option<T> {
        let path = self.root.join(rel);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "store file missing, treating as empty");
                warnings.push(format!("{rel} not found"));
                return None;
            }
            Err(e) => {
                warnings.push(format!("could not read {rel}: {e}"));
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = %path.display(), "malformed store file: {e}");
                warnings.push(format!("could not parse {rel}: {e}"));
                None
            }
        }
    }

    /// Host files live one directory level down: the directory name is the
    /// config group. A record that does not name its config group inherits
    /// it from the directory.
    fn load_hosts(&self, warnings: &mut Vec<String>) -> Vec<HostRecord> {
        let configs = self.root.join(CONFIGS_DIR);
        let mut hosts = Vec::new();
        let groups = match fs::read_dir(&configs) {
            Ok(groups) => groups,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %configs.display(), "no configs directory");
                warnings.push(format!("{CONFIGS_DIR} not found"));
                return hosts;
            }
            Err(e) => {
                warnings.push(format!("could not read {CONFIGS_DIR}: {e}"));
                return hosts;
            }
        };
        let mut group_dirs: Vec<PathBuf> = groups
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_dir())
            .collect();
        group_dirs.sort();
        for group_dir in group_dirs {
            let config_group = group_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let mut files: Vec<PathBuf> = match fs::read_dir(&group_dir) {
                Ok(entries) => entries
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                    .collect(),
                Err(e) => {
                    warnings.push(format!("could not read {}: {e}", group_dir.display()));
                    continue;
                }
            };
            files.sort();
            for file in files {
                let rel = format!(
                    "{CONFIGS_DIR}/{config_group}/{}",
                    file.file_name()
                        .map(|n| n.to_string_lossy())
                        .unwrap_or_default()
                );
                if let Some(mut record) = self.read_json::<HostRecord>(&rel, warnings) {
                    if record.config_group.is_none() {
                        record.config_group = Some(config_group.clone());
                    }
                    hosts.push(record);
                }
            }
        }
        debug!(hosts = hosts.len(), "loaded host records");
        hosts
    }

    /// Write a full record set back to the root, archiving the previous
    /// generation first. Returns one result line per file written, like a
    /// save report.
    pub fn save_all(&self, records: &RecordSet) -> crate::Result<Vec<String>> {
        self.archive_current()?;
        let mut results = Vec::new();

        if let Some(users) = &records.users {
            self.write_json(USERS_FILE, users)?;
            results.push(format!("{USERS_FILE} written"));
        }
        if let Some(groups) = &records.groups {
            self.write_json(GROUPS_FILE, groups)?;
            results.push(format!("{GROUPS_FILE} written"));
        }
        self.write_json(USER_CATEGORIES_FILE, &records.user_categories)?;
        results.push(format!("{USER_CATEGORIES_FILE} written"));
        self.write_json(GROUP_CATEGORIES_FILE, &records.group_categories)?;
        results.push(format!("{GROUP_CATEGORIES_FILE} written"));

        for host in &records.hosts {
            let Some(name) = &host.name else {
                results.push("skipped a host record with no name".to_string());
                continue;
            };
            let config_group = host.config_group.as_deref().unwrap_or(DEFAULT_CONFIG_GROUP);
            let rel = format!("{CONFIGS_DIR}/{config_group}/{name}.json");
            self.write_json(&rel, host)?;
            results.push(format!("{rel} written"));
        }
        Ok(results)
    }

    /// Move the current generation into `archive/<timestamp>/`. A root
    /// with no generation yet archives nothing.
    fn archive_current(&self) -> crate::Result<()> {
        let current: Vec<&str> = [
            USERS_FILE,
            GROUPS_FILE,
            "includes",
            CONFIGS_DIR,
        ]
        .into_iter()
        .filter(|rel| self.root.join(rel).exists())
        .collect();
        if current.is_empty() {
            return Ok(());
        }
        let stamp = Utc::now().format("%Y%m%d%H%M%S%3f").to_string();
        let archive = self.root.join(ARCHIVE_DIR).join(stamp);
        fs::create_dir_all(&archive).map_err(|e| StoreError::Io {
            path: archive.clone(),
            source: e,
        })?;
        for rel in current {
            let from = self.root.join(rel);
            let to = archive.join(rel);
            fs::rename(&from, &to).map_err(|e| StoreError::Io {
                path: from.clone(),
                source: e,
            })?;
        }
        debug!(archive = %archive.display(), "archived previous generation");
        Ok(())
    }

    fn write_json<T: Serialize>(&self, rel: &str, value: &T) -> crate::Result<()> {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let text = serde_json::to_string_pretty(value).map_err(|e| StoreError::Parse {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, text).map_err(|e| StoreError::Io { path, source: e })?;
        Ok(())
    }
}
