use std::collections::BTreeMap;

use tracing::warn;

use super::{ManagerError, ManagerMeta};
use crate::model::{Host, HostUserAccount, Presence, User};
use crate::perms::{Action, Identity, check};
use crate::records::{ModeSpec, UserManagerRecord, UserRecord};
use crate::resolve::{Issue, Ledger};

/// Owns the authoritative list of valid users.
#[derive(Debug)]
pub struct UserManager {
    meta: ManagerMeta,
    users: BTreeMap<String, User>,
    errors: Vec<String>,
}

impl UserManager {
    pub(crate) fn new(identity: &Identity) -> Self {
        UserManager {
            meta: ManagerMeta::new("user manager", identity),
            users: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn meta(&self) -> &ManagerMeta {
        &self.meta
    }

    /// Errors accumulated by the last bulk load.
    pub fn load_errors(&self) -> &[String] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Add a user to the valid list. Name uniqueness is checked before uid
    /// uniqueness; a rejected add leaves the collection untouched.
    pub fn add(&mut self, identity: &Identity, user: User) -> crate::Result<()> {
        check(identity, &self.meta, Action::Write)?;
        self.insert(user)?;
        Ok(())
    }

    pub(crate) fn insert(&mut self, user: User) -> Result<(), ManagerError> {
        if self.users.contains_key(user.name()) {
            return Err(ManagerError::DuplicateName {
                kind: "user",
                name: user.name().to_string(),
            });
        }
        if let Some(uid) = user.uid()
            && let Some(existing) = self.users.values().find(|u| u.uid() == Some(uid))
        {
            return Err(ManagerError::DuplicateId {
                kind: "user",
                name: user.name().to_string(),
                id: uid,
                existing: existing.name().to_string(),
            });
        }
        self.users.insert(user.name().to_string(), user);
        Ok(())
    }

    pub fn find(&self, identity: &Identity, name: &str) -> crate::Result<Option<&User>> {
        check(identity, &self.meta, Action::Read)?;
        Ok(self.users.get(name))
    }

    pub fn find_by_uid(&self, identity: &Identity, uid: u32) -> crate::Result<Option<&User>> {
        check(identity, &self.meta, Action::Read)?;
        Ok(self.users.values().find(|u| u.uid() == Some(uid)))
    }

    /// Assign a new uid, refusing a uid already held by another user.
    pub fn update_uid(&mut self, identity: &Identity, name: &str, uid: u32) -> crate::Result<()> {
        check(identity, &self.meta, Action::Write)?;
        if let Some(existing) = self
            .users
            .values()
            .find(|u| u.uid() == Some(uid) && u.name() != name)
        {
            return Err(ManagerError::DuplicateId {
                kind: "user",
                name: name.to_string(),
                id: uid,
                existing: existing.name().to_string(),
            }
            .into());
        }
        let user = self.users.get(name).ok_or(ManagerError::UnknownUser {
            name: name.to_string(),
        })?;
        let updated = User::with_details(
            user.name(),
            Some(uid),
            user.key_path().map(String::from),
            user.state(),
        )?;
        self.users.insert(name.to_string(), updated);
        Ok(())
    }

    pub(crate) fn get(&self, name: &str) -> Option<&User> {
        self.users.get(name)
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.users.contains_key(name)
    }

    /// Bulk-load from a persisted record. One bad user record appends one
    /// error and loading continues; the count of loaded users is returned.
    pub(crate) fn load_records(&mut self, record: &UserManagerRecord) -> usize {
        if let Err(e) = self
            .meta
            .apply_record(&record.owner, &record.group, &record.permissions)
        {
            warn!("user manager record has invalid permissions: {e}");
            self.errors.push(e.to_string());
        }
        let mut loaded = 0;
        for user_record in &record.users {
            let result = user_record.to_model().and_then(|user| {
                self.insert(user)
                    .map_err(|e| crate::model::ModelError::InvalidRecord {
                        reason: e.to_string(),
                    })
            });
            match result {
                Ok(()) => loaded += 1,
                Err(e) => {
                    warn!("error validating user: {e}");
                    self.errors.push(format!("Error validating user. {e}"));
                }
            }
        }
        loaded
    }

    pub fn export(&self, identity: &Identity) -> crate::Result<UserManagerRecord> {
        check(identity, &self.meta, Action::Read)?;
        Ok(UserManagerRecord {
            owner: Some(self.meta.owner.clone()),
            group: Some(self.meta.group.clone()),
            permissions: Some(ModeSpec::from_mode(self.meta.mode)),
            users: self.users.values().map(UserRecord::from_model).collect(),
        })
    }

    /// Attach a user account to a host, merging with an existing account for
    /// the same user. The account's user must be valid; unknown key
    /// grantees are recorded on the ledger and skipped.
    pub(crate) fn attach_account(
        &self,
        host: &mut Host,
        account: HostUserAccount,
        ledger: &mut Ledger,
    ) -> Result<(), ManagerError> {
        if !self.contains(account.user()) {
            return Err(ManagerError::UnknownUser {
                name: account.user().to_string(),
            });
        }
        let mut account = account;
        let keys = std::mem::take(account.authorized_keys_mut());
        for key in keys {
            if self.contains(&key.user) {
                account.grant_key(key);
            } else {
                ledger.record(Issue::UnresolvedUser {
                    name: key.user.clone(),
                    context: format!("authorized key for account '{}'", account.user()),
                });
            }
        }
        match host.find_account_mut(account.user()) {
            Some(existing) => {
                // name equality already established by the lookup
                existing
                    .merge(&account)
                    .expect("merging accounts for the same user");
            }
            None => host.push_account(account),
        }
        Ok(())
    }

    /// Set a user's state directly, without cascading. Returns whether the
    /// state actually changed, or `None` for an unknown user. Cascading
    /// state changes go through the kernel.
    pub(crate) fn set_state(&mut self, name: &str, state: Presence) -> Option<bool> {
        let user = self.users.get_mut(name)?;
        if user.state() == state {
            return Some(false);
        }
        user.set_state(state);
        Some(true)
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<User> {
        self.users.remove(name)
    }
}
