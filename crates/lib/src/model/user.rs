use super::{ModelError, Presence, valid_entity_name};

/// A user known to the store.
///
/// Users are keyed by name; the uid is an optional secondary key that must
/// also be unique when present. The public key path points at the user's
/// authentication key on disk — key generation itself is outside the kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    name: String,
    uid: Option<u32>,
    key_path: Option<String>,
    state: Presence,
}

impl User {
    /// Create a present user with the given name.
    pub fn new(name: impl Into<String>) -> Result<Self, ModelError> {
        let name = name.into();
        if !valid_entity_name(&name) {
            return Err(ModelError::InvalidName { kind: "user", name });
        }
        Ok(User {
            name,
            uid: None,
            key_path: None,
            state: Presence::Present,
        })
    }

    /// Create a user with all fields supplied, as read from a record.
    pub fn with_details(
        name: impl Into<String>,
        uid: Option<u32>,
        key_path: Option<String>,
        state: Presence,
    ) -> Result<Self, ModelError> {
        let mut user = User::new(name)?;
        user.uid = uid;
        user.key_path = key_path;
        user.state = state;
        Ok(user)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uid(&self) -> Option<u32> {
        self.uid
    }

    pub fn key_path(&self) -> Option<&str> {
        self.key_path.as_deref()
    }

    pub fn state(&self) -> Presence {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: Presence) {
        self.state = state;
    }

    /// Merge another record for the same user into this one. Scalars keep
    /// the existing value unless unset; absence is sticky.
    pub fn merge(&mut self, other: &User) -> Result<(), ModelError> {
        if self.name != other.name {
            return Err(ModelError::NameMismatch {
                existing: self.name.clone(),
                incoming: other.name.clone(),
            });
        }
        if self.uid.is_none() {
            self.uid = other.uid;
        }
        if self.key_path.is_none() {
            self.key_path = other.key_path.clone();
        }
        self.state = self.state.merged(other.state);
        Ok(())
    }
}
