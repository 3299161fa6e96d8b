//! Permission guard error types.

use thiserror::Error as ThisError;

use super::Action;
use crate::Error;

/// Errors raised by the permission guard.
#[non_exhaustive]
#[derive(Debug, ThisError)]
pub enum PermsError {
    /// A permission spec was not a 3-digit octal value or a 9-character
    /// `rwx` triad.
    #[error("invalid permission spec '{spec}'")]
    InvalidMode {
        /// The offending spec as written
        spec: String,
    },

    /// A guarded operation was refused.
    #[error(
        "user '{identity}' does not have the required permissions for {entity} for the action '{action}'"
    )]
    AccessDenied {
        /// Name of the acting identity
        identity: String,
        /// Description of the protected entity
        entity: String,
        /// The action that was attempted
        action: Action,
    },
}

impl PermsError {
    /// Check if this error is a permission denial.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, PermsError::AccessDenied { .. })
    }
}

impl From<PermsError> for Error {
    fn from(err: PermsError) -> Self {
        Error::Perms(err)
    }
}
