//! Garrison is a configuration kernel for fleet account management: it
//! owns the authoritative registries of users, groups, hosts, reusable
//! include categories and sudo rules, cross-checks every host definition
//! against them, and hands fully resolved hosts to an external automation
//! engine adapter.
//!
//! The shape of the library:
//!
//! - [`model`] — the validated entity types (users, groups, hosts,
//!   bindings, categories, sudo rules) and their merge semantics.
//! - [`perms`] — the Unix-style permission guard every read and mutation
//!   passes through.
//! - [`manager`] — one exclusive owner per entity collection, enforcing
//!   uniqueness and implementing the host-binding logic for its entity.
//! - [`resolve`] — turns raw host records into cross-checked [`model::Host`]s,
//!   accumulating non-fatal problems on a per-host error ledger.
//! - [`registry`] — the [`registry::Kernel`], wiring the managers together
//!   in dependency order and driving state cascades and deletions.
//! - [`records`] — the serde structs mirroring the persisted JSON.
//! - [`store`] — the file datastore (load, archive, save).
//! - [`export`] — the [`export::ArtifactWriter`] boundary for engine
//!   adapters.
//!
//! ```no_run
//! use garrison::perms::Identity;
//! use garrison::registry::Kernel;
//! use garrison::store::FileStore;
//!
//! fn main() -> garrison::Result<()> {
//!     let admin = Identity::admin("root");
//!     let store = FileStore::new("/var/lib/garrison");
//!     let (records, _warnings) = store.load();
//!     let mut kernel = Kernel::new(&admin)?;
//!     let report = kernel.load_all(&admin, &records)?;
//!     for message in &report.errors {
//!         eprintln!("skipped: {message}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod constants;
pub mod export;
pub mod manager;
pub mod model;
pub mod perms;
pub mod records;
pub mod registry;
pub mod resolve;
pub mod store;

pub use manager::ManagerError;
pub use model::ModelError;
pub use perms::{Identity, PermsError};
pub use registry::{Kernel, RegistryError};
pub use resolve::{Issue, Ledger};
pub use store::{FileStore, StoreError};

use thiserror::Error as ThisError;

/// Top-level error for all kernel operations.
///
/// Module errors pass through transparently, so matching on the inner type
/// keeps working while callers that only want a broad classification can
/// use the helper predicates.
#[non_exhaustive]
#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Perms(PermsError),

    #[error(transparent)]
    Model(ModelError),

    #[error(transparent)]
    Manager(ManagerError),

    #[error(transparent)]
    Registry(RegistryError),

    #[error(transparent)]
    Store(StoreError),

    /// I/O outside the store's own files.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// JSON handling outside the store's own files.
    #[error("serialization error")]
    Serialize(#[from] serde_json::Error),
}

impl Error {
    /// The module that raised the error, for logging and coarse dispatch.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Perms(_) => "perms",
            Error::Model(_) => "model",
            Error::Manager(_) => "manager",
            Error::Registry(_) => "registry",
            Error::Store(_) => "store",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error is a permission denial.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Error::Perms(e) if e.is_access_denied())
    }

    /// Check if this error means a named entity does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Manager(e) => e.is_not_found(),
            Error::Registry(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error is a name or id conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Manager(e) if e.is_conflict())
    }

    /// Check if this error refused a deletion because present references
    /// remain.
    pub fn is_still_referenced(&self) -> bool {
        matches!(self, Error::Registry(e) if e.is_still_referenced())
    }
}

/// Result alias for all fallible kernel operations.
pub type Result<T> = std::result::Result<T, Error>;
