use super::{
    HostGroupBinding, HostUserAccount, ModelError, SudoEntry, valid_entity_name, valid_host_name,
};
use crate::perms::{Mode, Protected};

/// How the automation engine reaches the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAccess {
    /// Remote login name.
    pub remote_user: String,
    /// How the remote user authenticates.
    pub auth: AuthMethod,
    /// Whether the engine escalates with sudo after login.
    pub become_user: bool,
}

/// Remote authentication method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    Password,
    PublicKey,
}

impl AuthMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMethod::Password => "password",
            AuthMethod::PublicKey => "publicKey",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ModelError> {
        match value {
            "password" => Ok(AuthMethod::Password),
            "publicKey" => Ok(AuthMethod::PublicKey),
            other => Err(ModelError::InvalidRecord {
                reason: format!("authentication must be 'password' or 'publicKey', not '{other}'"),
            }),
        }
    }
}

/// Host-level sshd policy, passed through to the exporter untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SshPolicy {
    pub permit_root: Option<bool>,
    pub password_authentication: Option<bool>,
}

/// Category names a host pulls in. The categories are expanded and merged
/// into the host's own bindings at resolution time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Includes {
    pub user_categories: Vec<String>,
    pub group_categories: Vec<String>,
}

impl Includes {
    pub fn is_empty(&self) -> bool {
        self.user_categories.is_empty() && self.group_categories.is_empty()
    }
}

/// Key a host is registered under: hosts with the same name may exist in
/// different config groups.
pub type HostKey = (String, String);

/// A managed host: its identity, its permission metadata, and the account,
/// group and sudo bindings that should hold on it.
///
/// All references inside the collections are names resolving into the user
/// and group managers; a host never owns a user or group.
#[derive(Debug, Clone, PartialEq)]
pub struct Host {
    name: String,
    config_group: String,
    owner: String,
    group: String,
    mode: Mode,
    remote_access: Option<RemoteAccess>,
    ssh: Option<SshPolicy>,
    user_accounts: Vec<HostUserAccount>,
    group_bindings: Vec<HostGroupBinding>,
    sudo_entries: Vec<SudoEntry>,
    includes: Includes,
}

impl Host {
    pub fn new(
        name: impl Into<String>,
        config_group: impl Into<String>,
        owner: impl Into<String>,
        group: impl Into<String>,
        mode: Mode,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        if !valid_host_name(&name) {
            return Err(ModelError::InvalidName { kind: "host", name });
        }
        let config_group = config_group.into();
        if !valid_entity_name(&config_group) {
            return Err(ModelError::InvalidName {
                kind: "config group",
                name: config_group,
            });
        }
        Ok(Host {
            name,
            config_group,
            owner: owner.into(),
            group: group.into(),
            mode,
            remote_access: None,
            ssh: None,
            user_accounts: Vec::new(),
            group_bindings: Vec::new(),
            sudo_entries: Vec::new(),
            includes: Includes::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config_group(&self) -> &str {
        &self.config_group
    }

    pub fn key(&self) -> HostKey {
        (self.name.clone(), self.config_group.clone())
    }

    pub fn remote_access(&self) -> Option<&RemoteAccess> {
        self.remote_access.as_ref()
    }

    pub fn set_remote_access(&mut self, access: RemoteAccess) {
        self.remote_access = Some(access);
    }

    pub fn ssh(&self) -> Option<&SshPolicy> {
        self.ssh.as_ref()
    }

    pub fn set_ssh(&mut self, policy: SshPolicy) {
        self.ssh = Some(policy);
    }

    pub fn user_accounts(&self) -> &[HostUserAccount] {
        &self.user_accounts
    }

    pub fn group_bindings(&self) -> &[HostGroupBinding] {
        &self.group_bindings
    }

    pub fn sudo_entries(&self) -> &[SudoEntry] {
        &self.sudo_entries
    }

    pub fn includes(&self) -> &Includes {
        &self.includes
    }

    pub fn find_account(&self, user: &str) -> Option<&HostUserAccount> {
        self.user_accounts.iter().find(|a| a.user() == user)
    }

    pub fn find_binding(&self, group: &str) -> Option<&HostGroupBinding> {
        self.group_bindings.iter().find(|b| b.group() == group)
    }

    pub(crate) fn find_account_mut(&mut self, user: &str) -> Option<&mut HostUserAccount> {
        self.user_accounts.iter_mut().find(|a| a.user() == user)
    }

    pub(crate) fn find_binding_mut(&mut self, group: &str) -> Option<&mut HostGroupBinding> {
        self.group_bindings.iter_mut().find(|b| b.group() == group)
    }

    pub(crate) fn push_account(&mut self, account: HostUserAccount) {
        self.user_accounts.push(account);
    }

    pub(crate) fn push_binding(&mut self, binding: HostGroupBinding) {
        self.group_bindings.push(binding);
    }

    pub(crate) fn push_sudo_entry(&mut self, entry: SudoEntry) {
        self.sudo_entries.push(entry);
    }

    pub(crate) fn user_accounts_mut(&mut self) -> &mut Vec<HostUserAccount> {
        &mut self.user_accounts
    }

    pub(crate) fn group_bindings_mut(&mut self) -> &mut Vec<HostGroupBinding> {
        &mut self.group_bindings
    }

    pub(crate) fn sudo_entries_mut(&mut self) -> &mut Vec<SudoEntry> {
        &mut self.sudo_entries
    }

    pub(crate) fn includes_mut(&mut self) -> &mut Includes {
        &mut self.includes
    }
}

impl Protected for Host {
    fn owner(&self) -> &str {
        &self.owner
    }

    fn group(&self) -> &str {
        &self.group
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn describe(&self) -> String {
        format!("host '{}'", self.name)
    }
}
