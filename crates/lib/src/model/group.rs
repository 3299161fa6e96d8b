use super::{ModelError, Presence, valid_entity_name};

/// A group known to the store. Keyed by name with an optional unique gid,
/// with the same lifecycle rules as [`User`](super::User).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    name: String,
    gid: Option<u32>,
    state: Presence,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Result<Self, ModelError> {
        let name = name.into();
        if !valid_entity_name(&name) {
            return Err(ModelError::InvalidName { kind: "group", name });
        }
        Ok(Group {
            name,
            gid: None,
            state: Presence::Present,
        })
    }

    pub fn with_details(
        name: impl Into<String>,
        gid: Option<u32>,
        state: Presence,
    ) -> Result<Self, ModelError> {
        let mut group = Group::new(name)?;
        group.gid = gid;
        group.state = state;
        Ok(group)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gid(&self) -> Option<u32> {
        self.gid
    }

    pub fn state(&self) -> Presence {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: Presence) {
        self.state = state;
    }

    /// Merge semantics match [`User::merge`](super::User::merge).
    pub fn merge(&mut self, other: &Group) -> Result<(), ModelError> {
        if self.name != other.name {
            return Err(ModelError::NameMismatch {
                existing: self.name.clone(),
                incoming: other.name.clone(),
            });
        }
        if self.gid.is_none() {
            self.gid = other.gid;
        }
        self.state = self.state.merged(other.state);
        Ok(())
    }
}
