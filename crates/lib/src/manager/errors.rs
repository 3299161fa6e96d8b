//! Manager error types.

use thiserror::Error as ThisError;

use crate::Error;

/// Errors raised by manager collection operations.
#[non_exhaustive]
#[derive(Debug, ThisError)]
pub enum ManagerError {
    /// An entity with the same name already exists in the collection.
    #[error("{kind} '{name}' already exists")]
    DuplicateName {
        /// Entity kind ("user", "group", ...)
        kind: &'static str,
        /// The colliding name
        name: String,
    },

    /// A numeric secondary id (uid/gid) collides with a different entity.
    #[error("{kind} '{name}' with id {id} already exists as '{existing}'")]
    DuplicateId {
        kind: &'static str,
        /// Name of the entity being added
        name: String,
        /// The colliding numeric id
        id: u32,
        /// Name of the entity already holding the id
        existing: String,
    },

    /// A referenced user is not in the valid user list.
    #[error("user '{name}' was not found in the valid users list")]
    UnknownUser {
        /// The unresolved user name
        name: String,
    },

    /// A referenced group is not in the valid group list.
    #[error("group '{name}' was not found in the valid groups list")]
    UnknownGroup {
        /// The unresolved group name
        name: String,
    },

    /// A named category does not exist.
    #[error("{kind} '{name}' does not exist")]
    UnknownCategory {
        /// "user category" or "group category"
        kind: &'static str,
        /// The unresolved category name
        name: String,
    },

    /// A host lookup failed.
    #[error("host '{name}' in config group '{config_group}' does not exist")]
    UnknownHost {
        name: String,
        config_group: String,
    },

    /// Only named sudo entries can live in the reusable registry.
    #[error("a sudo entry must be named to be registered for reuse")]
    UnnamedSudoEntry,
}

impl ManagerError {
    /// Check if this error indicates a name or id conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ManagerError::DuplicateName { .. } | ManagerError::DuplicateId { .. }
        )
    }

    /// Check if this error indicates an unresolved reference.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ManagerError::UnknownUser { .. }
                | ManagerError::UnknownGroup { .. }
                | ManagerError::UnknownCategory { .. }
                | ManagerError::UnknownHost { .. }
        )
    }
}

impl From<ManagerError> for Error {
    fn from(err: ManagerError) -> Self {
        Error::Manager(err)
    }
}
