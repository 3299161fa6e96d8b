//! Validation error types for entity construction and merging.

use thiserror::Error as ThisError;

use crate::Error;

/// Errors raised while validating or combining entity records.
///
/// These are per-record errors: during bulk loads they are accumulated into
/// an error list and never abort the batch.
#[non_exhaustive]
#[derive(Debug, ThisError)]
pub enum ModelError {
    /// A name field was empty or contained non-word characters.
    #[error("'{name}' is not a valid {kind} name")]
    InvalidName {
        /// What kind of entity was being named
        kind: &'static str,
        /// The offending name
        name: String,
    },

    /// A mandatory field was missing from a record.
    #[error("missing mandatory field '{field}' in {context}")]
    MissingField {
        /// The missing field
        field: &'static str,
        /// Where the field was expected
        context: String,
    },

    /// A state field held something other than `present` or `absent`.
    #[error("state must be 'present' or 'absent', not '{value}'")]
    InvalidState {
        /// The offending value
        value: String,
    },

    /// Two records with different names were merged.
    #[error("cannot merge '{incoming}' into '{existing}': names differ")]
    NameMismatch {
        /// Name of the record being merged into
        existing: String,
        /// Name of the incoming record
        incoming: String,
    },

    /// A record was structurally invalid in some other way.
    #[error("invalid record: {reason}")]
    InvalidRecord {
        /// Description of the problem
        reason: String,
    },
}

impl From<ModelError> for Error {
    fn from(err: ModelError) -> Self {
        Error::Model(err)
    }
}
