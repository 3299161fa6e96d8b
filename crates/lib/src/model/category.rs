use super::{HostGroupBinding, HostUserAccount, ModelError, valid_entity_name};

/// A named, reusable ordered list of user-account templates. The templates
/// are not resolved against the valid user list until a host includes the
/// category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCategory {
    name: String,
    accounts: Vec<HostUserAccount>,
}

impl UserCategory {
    pub fn new(name: impl Into<String>, accounts: Vec<HostUserAccount>) -> Result<Self, ModelError> {
        let name = name.into();
        if !valid_entity_name(&name) {
            return Err(ModelError::InvalidName {
                kind: "user category",
                name,
            });
        }
        Ok(UserCategory { name, accounts })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn accounts(&self) -> &[HostUserAccount] {
        &self.accounts
    }

    /// Replace the template for the account's user, or append it.
    pub fn add_replace(&mut self, account: HostUserAccount) {
        self.accounts.retain(|a| a.user() != account.user());
        self.accounts.push(account);
    }

    pub(crate) fn purge_user(&mut self, user: &str) {
        self.accounts.retain(|a| a.user() != user);
        for account in &mut self.accounts {
            account.authorized_keys_mut().retain(|k| k.user != user);
        }
    }
}

/// A named, reusable ordered list of group-binding templates, resolved only
/// at the point of inclusion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCategory {
    name: String,
    bindings: Vec<HostGroupBinding>,
}

impl GroupCategory {
    pub fn new(
        name: impl Into<String>,
        bindings: Vec<HostGroupBinding>,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        if !valid_entity_name(&name) {
            return Err(ModelError::InvalidName {
                kind: "group category",
                name,
            });
        }
        Ok(GroupCategory { name, bindings })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bindings(&self) -> &[HostGroupBinding] {
        &self.bindings
    }

    pub fn add_replace(&mut self, binding: HostGroupBinding) {
        self.bindings.retain(|b| b.group() != binding.group());
        self.bindings.push(binding);
    }

    pub(crate) fn purge_user(&mut self, user: &str) {
        for binding in &mut self.bindings {
            binding.remove_member(user);
        }
    }

    pub(crate) fn purge_group(&mut self, group: &str) {
        self.bindings.retain(|b| b.group() != group);
    }
}
