use std::collections::BTreeMap;

use super::{GroupManager, ManagerError, ManagerMeta, UserManager};
use crate::model::{Host, Presence, SudoEntry};
use crate::perms::{Action, Identity, check};
use crate::resolve::{Issue, Ledger};

/// Owns named, reusable sudo rules and vets the rules hosts declare inline.
#[derive(Debug)]
pub struct SudoManager {
    meta: ManagerMeta,
    entries: BTreeMap<String, SudoEntry>,
}

impl SudoManager {
    pub(crate) fn new(identity: &Identity) -> Self {
        SudoManager {
            meta: ManagerMeta::new("sudo manager", identity),
            entries: BTreeMap::new(),
        }
    }

    pub fn meta(&self) -> &ManagerMeta {
        &self.meta
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register a named entry for reuse across hosts.
    pub fn add(&mut self, identity: &Identity, entry: SudoEntry) -> crate::Result<()> {
        check(identity, &self.meta, Action::Write)?;
        self.insert(entry)?;
        Ok(())
    }

    pub(crate) fn insert(&mut self, entry: SudoEntry) -> Result<(), ManagerError> {
        let name = entry.name().ok_or(ManagerError::UnnamedSudoEntry)?;
        if self.entries.contains_key(name) {
            return Err(ManagerError::DuplicateName {
                kind: "sudo entry",
                name: name.to_string(),
            });
        }
        self.entries.insert(name.to_string(), entry);
        Ok(())
    }

    pub fn find(&self, identity: &Identity, name: &str) -> crate::Result<Option<&SudoEntry>> {
        check(identity, &self.meta, Action::Read)?;
        Ok(self.entries.get(name))
    }

    /// Attach a sudo rule to a host. Principals that do not resolve to a
    /// valid user or group are recorded on the ledger and dropped; a rule
    /// left with no principals is still attached, it just grants nothing.
    pub(crate) fn attach_entry(
        &self,
        users: &UserManager,
        groups: &GroupManager,
        host: &mut Host,
        entry: SudoEntry,
        ledger: &mut Ledger,
    ) {
        let mut entry = entry;
        let principals = std::mem::take(entry.user_list_mut());
        for principal in principals {
            let known = if principal.is_group() {
                groups.contains(principal.name())
            } else {
                users.contains(principal.name())
            };
            if known {
                entry.add_principal(principal);
            } else if principal.is_group() {
                ledger.record(Issue::UnresolvedGroup {
                    name: principal.name().to_string(),
                    context: "sudo entry principal".to_string(),
                });
            } else {
                ledger.record(Issue::UnresolvedUser {
                    name: principal.name().to_string(),
                    context: "sudo entry principal".to_string(),
                });
            }
        }
        host.push_sudo_entry(entry);
    }

    pub(crate) fn on_user_state(&mut self, name: &str, state: Presence) {
        for entry in self.entries.values_mut() {
            for principal in entry.user_list_mut() {
                if !principal.is_group() && principal.name() == name {
                    principal.set_state(state);
                }
            }
        }
    }

    pub(crate) fn on_group_state(&mut self, name: &str, state: Presence) {
        for entry in self.entries.values_mut() {
            for principal in entry.user_list_mut() {
                if principal.is_group() && principal.name() == name {
                    principal.set_state(state);
                }
            }
        }
    }

    pub(crate) fn purge_user(&mut self, name: &str) {
        for entry in self.entries.values_mut() {
            entry.remove_principal(false, name);
        }
    }

    pub(crate) fn purge_group(&mut self, name: &str) {
        for entry in self.entries.values_mut() {
            entry.remove_principal(true, name);
        }
    }

    /// Whether any named entry still grants the user while present.
    pub(crate) fn user_referenced_present(&self, name: &str) -> bool {
        self.entries.values().any(|entry| {
            entry
                .user_list()
                .iter()
                .any(|p| !p.is_group() && p.name() == name && p.state().is_present())
        })
    }

    pub(crate) fn group_referenced_present(&self, name: &str) -> bool {
        self.entries.values().any(|entry| {
            entry
                .user_list()
                .iter()
                .any(|p| p.is_group() && p.name() == name && p.state().is_present())
        })
    }
}
