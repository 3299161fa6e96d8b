use std::collections::BTreeMap;

use super::{ManagerError, ManagerMeta};
use crate::model::{Host, HostKey, Presence};
use crate::perms::{Action, Identity, allows, check};
use crate::resolve::Ledger;

/// A host together with the error ledger from its resolution. The ledger
/// stays attached for the host's lifetime so callers can always see what
/// was skipped when the host was built.
#[derive(Debug, Clone)]
pub struct ResolvedHost {
    pub host: Host,
    pub ledger: Ledger,
}

/// Owns every resolved host, keyed by `(name, config group)`.
///
/// Lookups are gated twice: the manager's own metadata guards the
/// collection, and each host's metadata guards the host itself.
#[derive(Debug)]
pub struct HostManager {
    meta: ManagerMeta,
    hosts: BTreeMap<HostKey, ResolvedHost>,
}

impl HostManager {
    pub(crate) fn new(identity: &Identity) -> Self {
        HostManager {
            meta: ManagerMeta::new("host manager", identity),
            hosts: BTreeMap::new(),
        }
    }

    pub fn meta(&self) -> &ManagerMeta {
        &self.meta
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub(crate) fn insert(&mut self, resolved: ResolvedHost) -> Result<(), ManagerError> {
        let key = resolved.host.key();
        if self.hosts.contains_key(&key) {
            return Err(ManagerError::DuplicateName {
                kind: "host",
                name: format!("{} ({})", key.0, key.1),
            });
        }
        self.hosts.insert(key, resolved);
        Ok(())
    }

    pub fn add(&mut self, identity: &Identity, host: Host) -> crate::Result<()> {
        check(identity, &self.meta, Action::Write)?;
        self.insert(ResolvedHost {
            host,
            ledger: Ledger::new(),
        })?;
        Ok(())
    }

    /// Look up a host, enforcing read access on the collection and then on
    /// the host itself.
    pub fn find(
        &self,
        identity: &Identity,
        name: &str,
        config_group: &str,
    ) -> crate::Result<Option<&Host>> {
        check(identity, &self.meta, Action::Read)?;
        match self.hosts.get(&(name.to_string(), config_group.to_string())) {
            Some(resolved) => {
                check(identity, &resolved.host, Action::Read)?;
                Ok(Some(&resolved.host))
            }
            None => Ok(None),
        }
    }

    /// The error ledger recorded when the host was resolved.
    pub fn ledger(&self, name: &str, config_group: &str) -> Option<&Ledger> {
        self.get(name, config_group).map(|resolved| &resolved.ledger)
    }

    /// All hosts the identity can read, silently omitting the rest.
    pub fn hosts(&self, identity: &Identity) -> crate::Result<Vec<&Host>> {
        check(identity, &self.meta, Action::Read)?;
        Ok(self
            .hosts
            .values()
            .filter(|resolved| allows(identity, &resolved.host, Action::Read))
            .map(|resolved| &resolved.host)
            .collect())
    }

    pub(crate) fn resolved(&self) -> impl Iterator<Item = &ResolvedHost> {
        self.hosts.values()
    }

    pub(crate) fn get(&self, name: &str, config_group: &str) -> Option<&ResolvedHost> {
        self.hosts.get(&(name.to_string(), config_group.to_string()))
    }

    pub fn delete(&mut self, identity: &Identity, name: &str, config_group: &str) -> crate::Result<()> {
        check(identity, &self.meta, Action::Write)?;
        let key = (name.to_string(), config_group.to_string());
        match self.hosts.get(&key) {
            Some(resolved) => check(identity, &resolved.host, Action::Write)?,
            None => {
                return Err(ManagerError::UnknownHost {
                    name: name.to_string(),
                    config_group: config_group.to_string(),
                }
                .into());
            }
        }
        self.hosts.remove(&key);
        Ok(())
    }

    /// Propagate a user state change into every host: the user's account,
    /// key grants made to the user, and any binding the user is a member of
    /// all take the new state. Records are flipped, never removed.
    pub(crate) fn on_user_state(&mut self, name: &str, state: Presence) {
        for resolved in self.hosts.values_mut() {
            let host = &mut resolved.host;
            for account in host.user_accounts_mut() {
                if account.user() == name {
                    account.set_state(state);
                }
                for key in account.authorized_keys_mut() {
                    if key.user == name {
                        key.state = state;
                    }
                }
            }
            for binding in host.group_bindings_mut() {
                if binding.has_member(name) {
                    binding.set_state(state);
                }
            }
            for entry in host.sudo_entries_mut() {
                for principal in entry.user_list_mut() {
                    if !principal.is_group() && principal.name() == name {
                        principal.set_state(state);
                    }
                }
            }
        }
    }

    /// Propagate a group state change: bindings for the group and group
    /// sudo principals take the new state.
    pub(crate) fn on_group_state(&mut self, name: &str, state: Presence) {
        for resolved in self.hosts.values_mut() {
            let host = &mut resolved.host;
            for binding in host.group_bindings_mut() {
                if binding.group() == name {
                    binding.set_state(state);
                }
            }
            for entry in host.sudo_entries_mut() {
                for principal in entry.user_list_mut() {
                    if principal.is_group() && principal.name() == name {
                        principal.set_state(state);
                    }
                }
            }
        }
    }

    /// Remove every trace of the user from every host.
    pub(crate) fn purge_user(&mut self, name: &str) {
        for resolved in self.hosts.values_mut() {
            let host = &mut resolved.host;
            host.user_accounts_mut().retain(|a| a.user() != name);
            for account in host.user_accounts_mut() {
                account.authorized_keys_mut().retain(|k| k.user != name);
            }
            for binding in host.group_bindings_mut() {
                binding.remove_member(name);
            }
            for entry in host.sudo_entries_mut() {
                entry.remove_principal(false, name);
            }
        }
    }

    /// Remove every trace of the group from every host.
    pub(crate) fn purge_group(&mut self, name: &str) {
        for resolved in self.hosts.values_mut() {
            let host = &mut resolved.host;
            host.group_bindings_mut().retain(|b| b.group() != name);
            for entry in host.sudo_entries_mut() {
                entry.remove_principal(true, name);
            }
        }
    }

    /// Whether any host still references the user in a present record.
    pub(crate) fn user_referenced_present(&self, name: &str) -> bool {
        !self.hosts_referencing_user(name).is_empty()
    }

    /// Whether any host still references the group in a present record.
    pub(crate) fn group_referenced_present(&self, name: &str) -> bool {
        !self.hosts_referencing_group(name).is_empty()
    }

    /// Hosts that still reference the user in a present record, rendered
    /// for deletion-refusal messages.
    pub(crate) fn hosts_referencing_user(&self, name: &str) -> Vec<String> {
        self.hosts
            .values()
            .filter(|resolved| {
                let host = &resolved.host;
                host.user_accounts().iter().any(|a| {
                    (a.user() == name && a.state().is_present())
                        || a.authorized_keys()
                            .iter()
                            .any(|k| k.user == name && k.state.is_present())
                }) || host
                    .group_bindings()
                    .iter()
                    .any(|b| b.has_member(name) && b.state().is_present())
                    || host.sudo_entries().iter().any(|e| {
                        e.user_list()
                            .iter()
                            .any(|p| !p.is_group() && p.name() == name && p.state().is_present())
                    })
            })
            .map(|resolved| format!("host '{}'", resolved.host.name()))
            .collect()
    }

    /// Hosts that still reference the group in a present record.
    pub(crate) fn hosts_referencing_group(&self, name: &str) -> Vec<String> {
        self.hosts
            .values()
            .filter(|resolved| {
                let host = &resolved.host;
                host.group_bindings()
                    .iter()
                    .any(|b| b.group() == name && b.state().is_present())
                    || host.sudo_entries().iter().any(|e| {
                        e.user_list()
                            .iter()
                            .any(|p| p.is_group() && p.name() == name && p.state().is_present())
                    })
            })
            .map(|resolved| format!("host '{}'", resolved.host.name()))
            .collect()
    }
}
