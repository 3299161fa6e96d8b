//! Entity value types for the configuration graph.
//!
//! Users, groups, hosts, host-level bindings, sudo entries and reusable
//! categories. These are plain validated records: construction checks the
//! shape, [`merge`](User::merge) implements the store-wide merge semantics
//! (scalars keep the existing value unless unset, lists union by key,
//! absence is sticky), and nothing here owns anything outside itself —
//! hosts reference users and groups by name only, never by pointer.

pub mod errors;

mod account;
mod binding;
mod category;
mod group;
mod host;
mod presence;
mod sudo;
mod user;


pub use account::{AuthorizedKey, HostUserAccount};
pub use binding::HostGroupBinding;
pub use category::{GroupCategory, UserCategory};
pub use errors::ModelError;
pub use group::Group;
pub use host::{AuthMethod, Host, HostKey, Includes, RemoteAccess, SshPolicy};
pub use presence::Presence;
pub use sudo::{CommandSpec, SudoEntry, SudoPrincipal};
pub use user::User;

/// Validates a user/group/category name: non-empty word characters.
pub(crate) fn valid_entity_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Validates a host name. Hosts additionally allow dots and hyphens so
/// fully-qualified names can be used as keys.
pub(crate) fn valid_host_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
}
