//! Registry error types.

use thiserror::Error as ThisError;

use crate::Error;

/// Errors raised by the kernel's cross-manager operations.
#[non_exhaustive]
#[derive(Debug, ThisError)]
pub enum RegistryError {
    /// The declared manager dependencies do not form a DAG. This is a
    /// construction-time defect, never a data problem.
    #[error("manager dependency declarations contain a cycle")]
    DependencyCycle,

    /// A kernel operation named an entity no manager knows.
    #[error("{kind} '{name}' does not exist")]
    UnknownEntity {
        /// Entity kind ("user", "group", ...)
        kind: &'static str,
        /// The unknown name
        name: String,
    },

    /// Deletion was refused because present records still reference the
    /// entity. Mark the entity absent and let the cascade run first.
    #[error("{kind} '{name}' is still referenced by: {}", references.join(", "))]
    ReferencedWhilePresent {
        kind: &'static str,
        name: String,
        /// Human-readable locations of the surviving references.
        references: Vec<String>,
    },
}

impl RegistryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::UnknownEntity { .. })
    }

    pub fn is_still_referenced(&self) -> bool {
        matches!(self, RegistryError::ReferencedWhilePresent { .. })
    }
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        Error::Registry(err)
    }
}
