//! Store error types.

use std::path::PathBuf;

use thiserror::Error as ThisError;

use crate::Error;

/// Errors raised by the file datastore.
#[non_exhaustive]
#[derive(Debug, ThisError)]
pub enum StoreError {
    /// An I/O operation on a store file failed.
    #[error("store I/O failed on {path}")]
    Io {
        /// The file or directory involved
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A store file held JSON that could not be serialized or parsed.
    #[error("malformed store file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Error::Store(err)
    }
}
