use std::collections::BTreeMap;

use tracing::warn;

use super::{ManagerError, ManagerMeta, UserManager};
use crate::model::{Group, Host, HostGroupBinding, Presence};
use crate::perms::{Action, Identity, check};
use crate::records::{GroupManagerRecord, GroupRecord, ModeSpec};
use crate::resolve::{Issue, Ledger};

/// Owns the authoritative list of valid groups.
#[derive(Debug)]
pub struct GroupManager {
    meta: ManagerMeta,
    groups: BTreeMap<String, Group>,
    errors: Vec<String>,
}

impl GroupManager {
    pub(crate) fn new(identity: &Identity) -> Self {
        GroupManager {
            meta: ManagerMeta::new("group manager", identity),
            groups: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn meta(&self) -> &ManagerMeta {
        &self.meta
    }

    pub fn load_errors(&self) -> &[String] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn add(&mut self, identity: &Identity, group: Group) -> crate::Result<()> {
        check(identity, &self.meta, Action::Write)?;
        self.insert(group)?;
        Ok(())
    }

    pub(crate) fn insert(&mut self, group: Group) -> Result<(), ManagerError> {
        if self.groups.contains_key(group.name()) {
            return Err(ManagerError::DuplicateName {
                kind: "group",
                name: group.name().to_string(),
            });
        }
        if let Some(gid) = group.gid()
            && let Some(existing) = self.groups.values().find(|g| g.gid() == Some(gid))
        {
            return Err(ManagerError::DuplicateId {
                kind: "group",
                name: group.name().to_string(),
                id: gid,
                existing: existing.name().to_string(),
            });
        }
        self.groups.insert(group.name().to_string(), group);
        Ok(())
    }

    pub fn find(&self, identity: &Identity, name: &str) -> crate::Result<Option<&Group>> {
        check(identity, &self.meta, Action::Read)?;
        Ok(self.groups.get(name))
    }

    pub fn find_by_gid(&self, identity: &Identity, gid: u32) -> crate::Result<Option<&Group>> {
        check(identity, &self.meta, Action::Read)?;
        Ok(self.groups.values().find(|g| g.gid() == Some(gid)))
    }

    /// Assign a new gid, refusing a gid already held by another group.
    pub fn update_gid(&mut self, identity: &Identity, name: &str, gid: u32) -> crate::Result<()> {
        check(identity, &self.meta, Action::Write)?;
        if let Some(existing) = self
            .groups
            .values()
            .find(|g| g.gid() == Some(gid) && g.name() != name)
        {
            return Err(ManagerError::DuplicateId {
                kind: "group",
                name: name.to_string(),
                id: gid,
                existing: existing.name().to_string(),
            }
            .into());
        }
        let group = self.groups.get(name).ok_or(ManagerError::UnknownGroup {
            name: name.to_string(),
        })?;
        let updated = Group::with_details(group.name(), Some(gid), group.state())?;
        self.groups.insert(name.to_string(), updated);
        Ok(())
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub(crate) fn load_records(&mut self, record: &GroupManagerRecord) -> usize {
        if let Err(e) = self
            .meta
            .apply_record(&record.owner, &record.group, &record.permissions)
        {
            warn!("group manager record has invalid permissions: {e}");
            self.errors.push(e.to_string());
        }
        let mut loaded = 0;
        for group_record in &record.groups {
            let result = group_record.to_model().and_then(|group| {
                self.insert(group)
                    .map_err(|e| crate::model::ModelError::InvalidRecord {
                        reason: e.to_string(),
                    })
            });
            match result {
                Ok(()) => loaded += 1,
                Err(e) => {
                    warn!("error validating group: {e}");
                    self.errors.push(format!("Error validating group. {e}"));
                }
            }
        }
        loaded
    }

    pub fn export(&self, identity: &Identity) -> crate::Result<GroupManagerRecord> {
        check(identity, &self.meta, Action::Read)?;
        Ok(GroupManagerRecord {
            owner: Some(self.meta.owner.clone()),
            group: Some(self.meta.group.clone()),
            permissions: Some(ModeSpec::from_mode(self.meta.mode)),
            groups: self.groups.values().map(GroupRecord::from_model).collect(),
        })
    }

    /// Attach a group binding to a host, merging with an existing binding
    /// for the same group. The bound group must be valid; members that do
    /// not resolve to valid users are recorded on the ledger and dropped,
    /// without failing the binding.
    pub(crate) fn attach_binding(
        &self,
        users: &UserManager,
        host: &mut Host,
        binding: HostGroupBinding,
        ledger: &mut Ledger,
    ) -> Result<(), ManagerError> {
        if !self.contains(binding.group()) {
            return Err(ManagerError::UnknownGroup {
                name: binding.group().to_string(),
            });
        }
        let mut resolved = HostGroupBinding::new(binding.group())
            .expect("group name validated on construction");
        resolved.set_state(binding.state());
        for member in binding.members() {
            if users.contains(member) {
                resolved.add_member(member.clone());
            } else {
                ledger.record(Issue::UnresolvedUser {
                    name: member.clone(),
                    context: format!("member of group binding '{}'", binding.group()),
                });
            }
        }
        match host.find_binding_mut(resolved.group()) {
            Some(existing) => {
                existing
                    .merge(&resolved)
                    .expect("merging bindings for the same group");
            }
            None => host.push_binding(resolved),
        }
        Ok(())
    }

    pub(crate) fn set_state(&mut self, name: &str, state: Presence) -> Option<bool> {
        let group = self.groups.get_mut(name)?;
        if group.state() == state {
            return Some(false);
        }
        group.set_state(state);
        Some(true)
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Group> {
        self.groups.remove(name)
    }
}
