//! Managers: the exclusive owners of each entity collection.
//!
//! One manager per entity type. A manager owns the authoritative collection
//! of valid entities, enforces name/id uniqueness on insertion, implements
//! the host-binding logic for its own entity type, and carries collection
//! metadata (owner, group, mode) that the permission guard checks on every
//! guarded read or mutation. Identities are threaded through explicitly;
//! managers hold no reference to each other — cross-manager queries go
//! through the kernel in [`crate::registry`].

use crate::perms::{Identity, Mode, Protected};
use crate::records::ModeSpec;

pub mod errors;

mod categories;
mod groups;
mod hosts;
mod sudo;
mod users;

#[cfg(test)]
mod tests;

pub use categories::{GroupCategoryManager, UserCategoryManager};
pub use errors::ManagerError;
pub use groups::GroupManager;
pub use hosts::{HostManager, ResolvedHost};
pub use sudo::SudoManager;
pub use users::UserManager;

/// Permission metadata for a manager's collection.
///
/// Each persisted manager record carries owner/group/permissions for the
/// collection as a whole; the guard checks these on collection-level
/// operations the same way it checks a host's own metadata on host-level
/// operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerMeta {
    owner: String,
    group: String,
    mode: Mode,
    label: &'static str,
}

impl ManagerMeta {
    /// Metadata defaults: owned by the constructing identity and its
    /// primary group, collection mode 0o660.
    pub(crate) fn new(label: &'static str, identity: &Identity) -> Self {
        ManagerMeta {
            owner: identity.name.clone(),
            group: identity.primary_group.clone(),
            mode: Mode::from_bits(crate::constants::DEFAULT_MANAGER_MODE)
                .expect("default manager mode is valid"),
            label,
        }
    }

    /// Overlay fields from a persisted record; absent fields keep their
    /// defaults. A malformed permission spec is returned for the caller to
    /// ledger without aborting the load.
    pub(crate) fn apply_record(
        &mut self,
        owner: &Option<String>,
        group: &Option<String>,
        permissions: &Option<ModeSpec>,
    ) -> Result<(), crate::perms::PermsError> {
        if let Some(owner) = owner {
            self.owner = owner.clone();
        }
        if let Some(group) = group {
            self.group = group.clone();
        }
        if let Some(spec) = permissions {
            self.mode = spec.to_mode()?;
        }
        Ok(())
    }
}

impl Protected for ManagerMeta {
    fn owner(&self) -> &str {
        &self.owner
    }

    fn group(&self) -> &str {
        &self.group
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn describe(&self) -> String {
        self.label.to_string()
    }
}
