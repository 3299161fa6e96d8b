use super::{ModelError, Presence, valid_entity_name};

/// A grant allowing another user to authenticate as the account it is
/// attached to. Carries its own state so a revoked grant survives for
/// export as a removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedKey {
    /// Name of the grantee user.
    pub user: String,
    pub state: Presence,
}

impl AuthorizedKey {
    pub fn new(user: impl Into<String>) -> Self {
        AuthorizedKey {
            user: user.into(),
            state: Presence::Present,
        }
    }
}

/// Binds a host to one user: the local account that should exist (or be
/// removed) on that host. The user is referenced by name only; the user
/// record itself is owned by the user manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostUserAccount {
    user: String,
    authorized_keys: Vec<AuthorizedKey>,
    state: Presence,
}

impl HostUserAccount {
    pub fn new(user: impl Into<String>) -> Result<Self, ModelError> {
        let user = user.into();
        if !valid_entity_name(&user) {
            return Err(ModelError::InvalidName {
                kind: "user",
                name: user,
            });
        }
        Ok(HostUserAccount {
            user,
            authorized_keys: Vec::new(),
            state: Presence::Present,
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn state(&self) -> Presence {
        self.state
    }

    pub fn set_state(&mut self, state: Presence) {
        self.state = state;
    }

    pub fn authorized_keys(&self) -> &[AuthorizedKey] {
        &self.authorized_keys
    }

    pub(crate) fn authorized_keys_mut(&mut self) -> &mut Vec<AuthorizedKey> {
        &mut self.authorized_keys
    }

    /// Add a key grant for `user`, merging with an existing grant for the
    /// same user instead of duplicating it.
    pub fn grant_key(&mut self, key: AuthorizedKey) {
        match self.authorized_keys.iter_mut().find(|k| k.user == key.user) {
            Some(existing) => existing.state = existing.state.merged(key.state),
            None => self.authorized_keys.push(key),
        }
    }

    pub fn find_key(&self, user: &str) -> Option<&AuthorizedKey> {
        self.authorized_keys.iter().find(|k| k.user == user)
    }

    /// Merge another account record for the same user into this one. Key
    /// grants are unioned by grantee name; absence is sticky on both the
    /// account and each grant.
    pub fn merge(&mut self, other: &HostUserAccount) -> Result<(), ModelError> {
        if self.user != other.user {
            return Err(ModelError::NameMismatch {
                existing: self.user.clone(),
                incoming: other.user.clone(),
            });
        }
        for key in &other.authorized_keys {
            self.grant_key(key.clone());
        }
        self.state = self.state.merged(other.state);
        Ok(())
    }
}
