use super::{ModelError, Presence};

/// The command portion of a sudo rule: who it runs as, the option string
/// (e.g. `NOPASSWD:`) and the commands it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub run_as: String,
    pub options: String,
    pub cmd_list: Vec<String>,
}

/// A user or group granted a sudo rule. Carries its own state so a member
/// can be flipped absent without losing the audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SudoPrincipal {
    User { name: String, state: Presence },
    Group { name: String, state: Presence },
}

impl SudoPrincipal {
    pub fn user(name: impl Into<String>) -> Self {
        SudoPrincipal::User {
            name: name.into(),
            state: Presence::Present,
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        SudoPrincipal::Group {
            name: name.into(),
            state: Presence::Present,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SudoPrincipal::User { name, .. } | SudoPrincipal::Group { name, .. } => name,
        }
    }

    pub fn state(&self) -> Presence {
        match self {
            SudoPrincipal::User { state, .. } | SudoPrincipal::Group { state, .. } => *state,
        }
    }

    pub fn set_state(&mut self, new: Presence) {
        match self {
            SudoPrincipal::User { state, .. } | SudoPrincipal::Group { state, .. } => *state = new,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, SudoPrincipal::Group { .. })
    }

    /// Key used for list union during merges: kind plus name.
    fn key(&self) -> (bool, &str) {
        (self.is_group(), self.name())
    }
}

/// A sudo rule granted to a mixed list of users and groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SudoEntry {
    name: Option<String>,
    user_list: Vec<SudoPrincipal>,
    command_spec: CommandSpec,
}

impl SudoEntry {
    pub fn new(command_spec: CommandSpec) -> Result<Self, ModelError> {
        if command_spec.cmd_list.is_empty() {
            return Err(ModelError::InvalidRecord {
                reason: "a sudo entry requires at least one command".to_string(),
            });
        }
        Ok(SudoEntry {
            name: None,
            user_list: Vec::new(),
            command_spec,
        })
    }

    /// A named entry, reusable through the sudo manager's registry.
    pub fn named(name: impl Into<String>, command_spec: CommandSpec) -> Result<Self, ModelError> {
        let mut entry = SudoEntry::new(command_spec)?;
        entry.name = Some(name.into());
        Ok(entry)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn user_list(&self) -> &[SudoPrincipal] {
        &self.user_list
    }

    pub(crate) fn user_list_mut(&mut self) -> &mut Vec<SudoPrincipal> {
        &mut self.user_list
    }

    pub fn command_spec(&self) -> &CommandSpec {
        &self.command_spec
    }

    /// Add a principal, merging state with an existing entry for the same
    /// user/group instead of duplicating it.
    pub fn add_principal(&mut self, principal: SudoPrincipal) {
        match self
            .user_list
            .iter_mut()
            .find(|p| p.key() == principal.key())
        {
            Some(existing) => {
                let merged = existing.state().merged(principal.state());
                existing.set_state(merged);
            }
            None => self.user_list.push(principal),
        }
    }

    pub(crate) fn remove_principal(&mut self, is_group: bool, name: &str) {
        self.user_list.retain(|p| p.key() != (is_group, name));
    }

    /// Merge another entry: principal union by (kind, name) with sticky
    /// absence; the command spec keeps the existing value.
    pub fn merge(&mut self, other: &SudoEntry) {
        for principal in &other.user_list {
            self.add_principal(principal.clone());
        }
    }

    /// Render the rule as a sudoers-style line, e.g.
    /// `%wheel,deploy ALL = (root) NOPASSWD: /bin/systemctl,/usr/bin/tail`.
    pub fn render(&self) -> String {
        let who: Vec<String> = self
            .user_list
            .iter()
            .map(|p| {
                if p.is_group() {
                    format!("%{}", p.name())
                } else {
                    p.name().to_string()
                }
            })
            .collect();
        format!(
            "{} ALL = ({}) {} {}",
            who.join(","),
            self.command_spec.run_as,
            self.command_spec.options,
            self.command_spec.cmd_list.join(",")
        )
    }
}
