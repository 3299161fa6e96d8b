//! Boundary record formats for persisted storage.
//!
//! These structs mirror the JSON shapes on disk: one record per manager
//! collection carrying `{owner, group, permissions, items}` and one record
//! per host file. Fields are deliberately loose (`Option`s, free-form state
//! strings) so a malformed record fails validation one record at a time
//! instead of aborting a whole file; validation lives in the conversions to
//! the model types, never in serde itself.

use serde::{Deserialize, Serialize};

use crate::model::{
    AuthMethod, AuthorizedKey, CommandSpec, Group, GroupCategory, Host, HostGroupBinding,
    HostUserAccount, Includes, ModelError, Presence, RemoteAccess, SshPolicy, SudoEntry,
    SudoPrincipal, User, UserCategory, valid_entity_name,
};
use crate::perms::{Mode, PermsError};


/// A permission spec as written in a record: either a bare number whose
/// decimal digits are octal digits (`760`), or a string (3-digit octal or a
/// 9-character `rwx` triad).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModeSpec {
    Number(u32),
    Text(String),
}

impl ModeSpec {
    pub fn to_mode(&self) -> Result<Mode, PermsError> {
        match self {
            ModeSpec::Number(n) => Mode::from_octal_digits(*n),
            ModeSpec::Text(s) => Mode::parse(s),
        }
    }

    /// The canonical serialized form: a 3-digit octal string.
    pub fn from_mode(mode: Mode) -> Self {
        ModeSpec::Text(mode.octal_string())
    }
}

fn parse_state(state: &Option<String>) -> Result<Presence, ModelError> {
    match state {
        Some(value) => Presence::parse(value),
        None => Ok(Presence::Present),
    }
}

/// A by-name reference to a user or group, optionally carrying a state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NameRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl NameRef {
    pub fn named(name: impl Into<String>) -> Self {
        NameRef {
            name: Some(name.into()),
            state: None,
        }
    }

    fn require_name(&self, context: &str) -> Result<&str, ModelError> {
        self.name.as_deref().ok_or_else(|| ModelError::MissingField {
            field: "name",
            context: context.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Users and groups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<u32>,
    /// Path to the user's public key file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl UserRecord {
    pub fn to_model(&self) -> Result<User, ModelError> {
        let name = self.name.as_deref().ok_or(ModelError::MissingField {
            field: "name",
            context: "user record".to_string(),
        })?;
        User::with_details(name, self.uid, self.key.clone(), parse_state(&self.state)?)
    }

    pub fn from_model(user: &User) -> Self {
        UserRecord {
            name: Some(user.name().to_string()),
            uid: user.uid(),
            key: user.key_path().map(String::from),
            state: Some(user.state().as_str().to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl GroupRecord {
    pub fn to_model(&self) -> Result<Group, ModelError> {
        let name = self.name.as_deref().ok_or(ModelError::MissingField {
            field: "name",
            context: "group record".to_string(),
        })?;
        Group::with_details(name, self.gid, parse_state(&self.state)?)
    }

    pub fn from_model(group: &Group) -> Self {
        GroupRecord {
            name: Some(group.name().to_string()),
            gid: group.gid(),
            state: Some(group.state().as_str().to_string()),
        }
    }
}

/// The `users.json` shape: collection metadata plus the user list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserManagerRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<ModeSpec>,
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

/// The `groups.json` shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupManagerRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<ModeSpec>,
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
}

// ---------------------------------------------------------------------------
// Host-level bindings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizedKeyRecord {
    pub user: NameRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccountRecord {
    pub user: NameRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorized_keys: Vec<AuthorizedKeyRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl UserAccountRecord {
    /// Convert to a model account. Malformed key grants are reported in the
    /// second half of the pair and skipped; only a malformed account itself
    /// is an error.
    pub fn to_model(&self) -> Result<(HostUserAccount, Vec<ModelError>), ModelError> {
        let name = self.user.require_name("host user account")?;
        let mut account = HostUserAccount::new(name)?;
        account.set_state(parse_state(&self.state)?);
        let mut issues = Vec::new();
        for key in &self.authorized_keys {
            let grantee = match key.user.require_name("authorized key") {
                Ok(grantee) => grantee,
                Err(e) => {
                    issues.push(e);
                    continue;
                }
            };
            match parse_state(&key.state) {
                Ok(state) => account.grant_key(AuthorizedKey {
                    user: grantee.to_string(),
                    state,
                }),
                Err(e) => issues.push(e),
            }
        }
        Ok((account, issues))
    }

    pub fn from_model(account: &HostUserAccount) -> Self {
        UserAccountRecord {
            user: NameRef {
                name: Some(account.user().to_string()),
                state: Some(account.state().as_str().to_string()),
            },
            authorized_keys: account
                .authorized_keys()
                .iter()
                .map(|key| AuthorizedKeyRecord {
                    user: NameRef::named(key.user.clone()),
                    state: Some(key.state.as_str().to_string()),
                })
                .collect(),
            state: Some(account.state().as_str().to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupBindingRecord {
    pub group: NameRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl GroupBindingRecord {
    /// Convert to a model binding. Syntactically invalid member names are
    /// reported and skipped without failing the binding.
    pub fn to_model(&self) -> Result<(HostGroupBinding, Vec<ModelError>), ModelError> {
        let name = self.group.require_name("host group binding")?;
        let mut binding = HostGroupBinding::new(name)?;
        binding.set_state(parse_state(&self.state)?);
        let mut issues = Vec::new();
        for member in &self.members {
            if valid_entity_name(member) {
                binding.add_member(member.clone());
            } else {
                issues.push(ModelError::InvalidName {
                    kind: "user",
                    name: member.clone(),
                });
            }
        }
        Ok((binding, issues))
    }

    pub fn from_model(binding: &HostGroupBinding) -> Self {
        GroupBindingRecord {
            group: NameRef::named(binding.group()),
            members: binding.members().to_vec(),
            state: Some(binding.state().as_str().to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSpecRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_as: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    #[serde(default)]
    pub cmd_list: Vec<String>,
}

/// One entry in a sudo rule's user list: `{"user": {...}}` or
/// `{"group": {...}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SudoPrincipalRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<NameRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<NameRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SudoEntryRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub user_list: Vec<SudoPrincipalRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_spec: Option<CommandSpecRecord>,
}

impl SudoEntryRecord {
    /// Convert to a model entry. A principal naming neither a user nor a
    /// group is reported and skipped.
    pub fn to_model(&self) -> Result<(SudoEntry, Vec<ModelError>), ModelError> {
        let spec = self.command_spec.as_ref().ok_or(ModelError::MissingField {
            field: "commandSpec",
            context: "sudo entry".to_string(),
        })?;
        let run_as = spec.run_as.clone().ok_or(ModelError::MissingField {
            field: "runAs",
            context: "sudo entry command spec".to_string(),
        })?;
        let mut entry = SudoEntry::new(CommandSpec {
            run_as,
            options: spec.options.clone().unwrap_or_default(),
            cmd_list: spec.cmd_list.clone(),
        })?;
        if let Some(name) = &self.name {
            entry = SudoEntry::named(name.clone(), entry.command_spec().clone())?;
        }
        let mut issues = Vec::new();
        for principal in &self.user_list {
            let converted = match (&principal.user, &principal.group) {
                (Some(user), None) => user.require_name("sudo user entry").and_then(|name| {
                    Ok(SudoPrincipal::User {
                        name: name.to_string(),
                        state: parse_state(&user.state)?,
                    })
                }),
                (None, Some(group)) => group.require_name("sudo group entry").and_then(|name| {
                    Ok(SudoPrincipal::Group {
                        name: name.to_string(),
                        state: parse_state(&group.state)?,
                    })
                }),
                _ => Err(ModelError::InvalidRecord {
                    reason: "a sudo user list entry must name exactly one user or group"
                        .to_string(),
                }),
            };
            match converted {
                Ok(principal) => entry.add_principal(principal),
                Err(e) => issues.push(e),
            }
        }
        Ok((entry, issues))
    }

    pub fn from_model(entry: &SudoEntry) -> Self {
        let spec = entry.command_spec();
        SudoEntryRecord {
            name: entry.name().map(String::from),
            user_list: entry
                .user_list()
                .iter()
                .map(|principal| {
                    let name_ref = NameRef {
                        name: Some(principal.name().to_string()),
                        state: Some(principal.state().as_str().to_string()),
                    };
                    if principal.is_group() {
                        SudoPrincipalRecord {
                            user: None,
                            group: Some(name_ref),
                        }
                    } else {
                        SudoPrincipalRecord {
                            user: Some(name_ref),
                            group: None,
                        }
                    }
                })
                .collect(),
            command_spec: Some(CommandSpecRecord {
                run_as: Some(spec.run_as.clone()),
                options: Some(spec.options.clone()),
                cmd_list: spec.cmd_list.clone(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Hosts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAccessRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sudo_authentication: Option<bool>,
}

impl RemoteAccessRecord {
    pub fn to_model(&self) -> Result<RemoteAccess, ModelError> {
        let remote_user = self.remote_user.clone().ok_or(ModelError::MissingField {
            field: "remoteUser",
            context: "remote access".to_string(),
        })?;
        let auth = match &self.authentication {
            Some(value) => AuthMethod::parse(value)?,
            None => AuthMethod::PublicKey,
        };
        Ok(RemoteAccess {
            remote_user,
            auth,
            become_user: self.sudo_authentication.unwrap_or(false),
        })
    }

    pub fn from_model(access: &RemoteAccess) -> Self {
        RemoteAccessRecord {
            remote_user: Some(access.remote_user.clone()),
            authentication: Some(access.auth.as_str().to_string()),
            sudo_authentication: Some(access.become_user),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SshPolicyRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permit_root: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_authentication: Option<bool>,
}

impl SshPolicyRecord {
    pub fn to_model(&self) -> SshPolicy {
        SshPolicy {
            permit_root: self.permit_root,
            password_authentication: self.password_authentication,
        }
    }

    pub fn from_model(policy: &SshPolicy) -> Self {
        SshPolicyRecord {
            permit_root: policy.permit_root,
            password_authentication: policy.password_authentication,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludesRecord {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_categories: Vec<String>,
}

impl IncludesRecord {
    pub fn to_model(&self) -> Includes {
        Includes {
            user_categories: self.user_categories.clone(),
            group_categories: self.group_categories.clone(),
        }
    }

    pub fn from_model(includes: &Includes) -> Self {
        IncludesRecord {
            user_categories: includes.user_categories.clone(),
            group_categories: includes.group_categories.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.user_categories.is_empty() && self.group_categories.is_empty()
    }
}

/// One host definition file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<ModeSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_access: Option<RemoteAccessRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh: Option<SshPolicyRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<UserAccountRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupBindingRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sudo_entries: Vec<SudoEntryRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub includes: Option<IncludesRecord>,
}

impl HostRecord {
    pub fn from_model(host: &Host) -> Self {
        HostRecord {
            name: Some(host.name().to_string()),
            owner: Some(crate::perms::Protected::owner(host).to_string()),
            group: Some(crate::perms::Protected::group(host).to_string()),
            permissions: Some(ModeSpec::from_mode(crate::perms::Protected::mode(host))),
            config_group: Some(host.config_group().to_string()),
            remote_access: host.remote_access().map(RemoteAccessRecord::from_model),
            ssh: host.ssh().map(SshPolicyRecord::from_model),
            users: host
                .user_accounts()
                .iter()
                .map(UserAccountRecord::from_model)
                .collect(),
            groups: host
                .group_bindings()
                .iter()
                .map(GroupBindingRecord::from_model)
                .collect(),
            sudo_entries: host
                .sudo_entries()
                .iter()
                .map(SudoEntryRecord::from_model)
                .collect(),
            includes: if host.includes().is_empty() {
                None
            } else {
                Some(IncludesRecord::from_model(host.includes()))
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// One entry in `includes/user-categories.json`: a named list of account
/// templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCategoryRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub config: Vec<UserAccountRecord>,
}

impl UserCategoryRecord {
    pub fn to_model(&self) -> Result<(UserCategory, Vec<ModelError>), ModelError> {
        let name = self.name.as_deref().ok_or(ModelError::MissingField {
            field: "name",
            context: "user category".to_string(),
        })?;
        let mut accounts = Vec::new();
        let mut issues = Vec::new();
        for template in &self.config {
            match template.to_model() {
                Ok((account, mut template_issues)) => {
                    accounts.push(account);
                    issues.append(&mut template_issues);
                }
                Err(e) => issues.push(e),
            }
        }
        Ok((UserCategory::new(name, accounts)?, issues))
    }

    pub fn from_model(category: &UserCategory) -> Self {
        UserCategoryRecord {
            name: Some(category.name().to_string()),
            config: category
                .accounts()
                .iter()
                .map(UserAccountRecord::from_model)
                .collect(),
        }
    }
}

/// One entry in `includes/group-categories.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCategoryRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub config: Vec<GroupBindingRecord>,
}

impl GroupCategoryRecord {
    pub fn to_model(&self) -> Result<(GroupCategory, Vec<ModelError>), ModelError> {
        let name = self.name.as_deref().ok_or(ModelError::MissingField {
            field: "name",
            context: "group category".to_string(),
        })?;
        let mut bindings = Vec::new();
        let mut issues = Vec::new();
        for template in &self.config {
            match template.to_model() {
                Ok((binding, mut template_issues)) => {
                    bindings.push(binding);
                    issues.append(&mut template_issues);
                }
                Err(e) => issues.push(e),
            }
        }
        Ok((GroupCategory::new(name, bindings)?, issues))
    }

    pub fn from_model(category: &GroupCategory) -> Self {
        GroupCategoryRecord {
            name: Some(category.name().to_string()),
            config: category
                .bindings()
                .iter()
                .map(GroupBindingRecord::from_model)
                .collect(),
        }
    }
}

/// Everything the persisted store hands the kernel for one full load.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub users: Option<UserManagerRecord>,
    pub groups: Option<GroupManagerRecord>,
    pub user_categories: Vec<UserCategoryRecord>,
    pub group_categories: Vec<GroupCategoryRecord>,
    pub hosts: Vec<HostRecord>,
}
