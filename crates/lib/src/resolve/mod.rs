//! Host resolution: from a raw host record to a fully cross-checked
//! [`Host`].
//!
//! Resolution validates every reference in the record against the entity
//! managers, expands included categories, and merges duplicate bindings.
//! Only a missing or invalid host name is fatal; every other problem lands
//! on the host's [`Ledger`] and resolution carries on with the record
//! skipped.

use tracing::debug;

use crate::constants::{DEFAULT_CONFIG_GROUP, DEFAULT_HOST_MODE};
use crate::manager::{
    GroupCategoryManager, GroupManager, ManagerError, SudoManager, UserCategoryManager,
    UserManager,
};
use crate::model::{Host, ModelError};
use crate::perms::{Identity, Mode};
use crate::records::HostRecord;

mod ledger;


pub use ledger::{Issue, Ledger};

/// Borrows the entity managers a host record must be resolved against.
pub struct HostResolver<'a> {
    pub users: &'a UserManager,
    pub groups: &'a GroupManager,
    pub sudo: &'a SudoManager,
    pub user_categories: &'a UserCategoryManager,
    pub group_categories: &'a GroupCategoryManager,
}

impl HostResolver<'_> {
    /// Resolve one host record into a host and its error ledger.
    ///
    /// `loader` fills in the owner and group when the record does not
    /// declare them. Returns an error only when the record cannot name a
    /// host at all.
    pub fn resolve(
        &self,
        loader: &Identity,
        record: &HostRecord,
    ) -> Result<(Host, Ledger), ModelError> {
        let name = record.name.as_deref().ok_or(ModelError::MissingField {
            field: "name",
            context: "host record".to_string(),
        })?;
        let mut ledger = Ledger::new();

        let mode = match &record.permissions {
            Some(spec) => match spec.to_mode() {
                Ok(mode) => mode,
                Err(e) => {
                    ledger.record(Issue::InvalidRecord {
                        message: e.to_string(),
                    });
                    default_host_mode()
                }
            },
            None => default_host_mode(),
        };
        let mut host = Host::new(
            name,
            record
                .config_group
                .as_deref()
                .unwrap_or(DEFAULT_CONFIG_GROUP),
            record.owner.as_deref().unwrap_or(&loader.name),
            record.group.as_deref().unwrap_or(&loader.primary_group),
            mode,
        )?;

        if let Some(access) = &record.remote_access {
            match access.to_model() {
                Ok(access) => host.set_remote_access(access),
                Err(e) => ledger.record(e.into()),
            }
        }
        if let Some(policy) = &record.ssh {
            host.set_ssh(policy.to_model());
        }

        for account_record in &record.users {
            match account_record.to_model() {
                Ok((account, issues)) => {
                    ledger.extend(issues.into_iter().map(Issue::from));
                    self.attach_account(&mut host, account, &mut ledger);
                }
                Err(e) => ledger.record(e.into()),
            }
        }
        for binding_record in &record.groups {
            match binding_record.to_model() {
                Ok((binding, issues)) => {
                    ledger.extend(issues.into_iter().map(Issue::from));
                    self.attach_binding(&mut host, binding, &mut ledger);
                }
                Err(e) => ledger.record(e.into()),
            }
        }
        for entry_record in &record.sudo_entries {
            match entry_record.to_model() {
                Ok((entry, issues)) => {
                    ledger.extend(issues.into_iter().map(Issue::from));
                    self.sudo
                        .attach_entry(self.users, self.groups, &mut host, entry, &mut ledger);
                }
                Err(e) => ledger.record(e.into()),
            }
        }

        if let Some(includes) = &record.includes {
            let includes = includes.to_model();
            self.expand_includes(&mut host, &includes, &mut ledger);
            *host.includes_mut() = includes;
        }

        debug!(
            host = host.name(),
            config_group = host.config_group(),
            issues = ledger.len(),
            "resolved host"
        );
        Ok((host, ledger))
    }

    /// Expand included categories into the host's own bindings, after the
    /// host's direct bindings so category templates merge into them.
    fn expand_includes(
        &self,
        host: &mut Host,
        includes: &crate::model::Includes,
        ledger: &mut Ledger,
    ) {
        for category_name in &includes.user_categories {
            match self.user_categories.get(category_name) {
                Some(category) => {
                    for template in category.accounts() {
                        self.attach_account(host, template.clone(), ledger);
                    }
                }
                None => ledger.record(Issue::UnknownCategory {
                    kind: "user category",
                    name: category_name.clone(),
                }),
            }
        }
        for category_name in &includes.group_categories {
            match self.group_categories.get(category_name) {
                Some(category) => {
                    for template in category.bindings() {
                        self.attach_binding(host, template.clone(), ledger);
                    }
                }
                None => ledger.record(Issue::UnknownCategory {
                    kind: "group category",
                    name: category_name.clone(),
                }),
            }
        }
    }

    fn attach_account(
        &self,
        host: &mut Host,
        account: crate::model::HostUserAccount,
        ledger: &mut Ledger,
    ) {
        let user = account.user().to_string();
        if let Err(e) = self.users.attach_account(host, account, ledger) {
            ledger.record(manager_issue(e, &format!("account '{user}'")));
        }
    }

    fn attach_binding(
        &self,
        host: &mut Host,
        binding: crate::model::HostGroupBinding,
        ledger: &mut Ledger,
    ) {
        let group = binding.group().to_string();
        if let Err(e) = self
            .groups
            .attach_binding(self.users, host, binding, ledger)
        {
            ledger.record(manager_issue(e, &format!("group binding '{group}'")));
        }
    }
}

fn default_host_mode() -> Mode {
    Mode::from_bits(DEFAULT_HOST_MODE).expect("default host mode is valid")
}

fn manager_issue(err: ManagerError, context: &str) -> Issue {
    match err {
        ManagerError::UnknownUser { name } => Issue::UnresolvedUser {
            name,
            context: context.to_string(),
        },
        ManagerError::UnknownGroup { name } => Issue::UnresolvedGroup {
            name,
            context: context.to_string(),
        },
        other => Issue::InvalidRecord {
            message: other.to_string(),
        },
    }
}
