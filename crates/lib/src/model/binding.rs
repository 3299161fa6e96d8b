use super::{ModelError, Presence, valid_entity_name};

/// Binds a host to one group, carrying the member users drawn from the
/// valid user list. Members are names, not owned records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostGroupBinding {
    group: String,
    members: Vec<String>,
    state: Presence,
}

impl HostGroupBinding {
    pub fn new(group: impl Into<String>) -> Result<Self, ModelError> {
        let group = group.into();
        if !valid_entity_name(&group) {
            return Err(ModelError::InvalidName {
                kind: "group",
                name: group,
            });
        }
        Ok(HostGroupBinding {
            group,
            members: Vec::new(),
            state: Presence::Present,
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn state(&self) -> Presence {
        self.state
    }

    pub fn set_state(&mut self, state: Presence) {
        self.state = state;
    }

    pub fn has_member(&self, user: &str) -> bool {
        self.members.iter().any(|m| m == user)
    }

    /// Add a member by name; already-present members are left alone.
    pub fn add_member(&mut self, user: impl Into<String>) {
        let user = user.into();
        if !self.has_member(&user) {
            self.members.push(user);
        }
    }

    pub(crate) fn remove_member(&mut self, user: &str) {
        self.members.retain(|m| m != user);
    }

    /// Merge another binding for the same group: member union, sticky
    /// absence.
    pub fn merge(&mut self, other: &HostGroupBinding) -> Result<(), ModelError> {
        if self.group != other.group {
            return Err(ModelError::NameMismatch {
                existing: self.group.clone(),
                incoming: other.group.clone(),
            });
        }
        for member in &other.members {
            self.add_member(member.clone());
        }
        self.state = self.state.merged(other.state);
        Ok(())
    }
}
