//! Unix-style permission guard for the configuration store.
//!
//! Every permission-bearing object in the store (hosts and the manager
//! collections themselves) carries an owner, a group and a 9-bit
//! owner/group/other mode. The guard maps an acting [`Identity`] onto one of
//! the three permission nibbles and decides whether a read, write or execute
//! is allowed. The guard is stateless: it holds no references to the store
//! and can be called from anywhere an identity and a [`Protected`] object
//! are in scope.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod errors;


pub use errors::PermsError;

/// An action gated by the permission guard, mapped to the classic
/// read/write/execute permission bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
    Execute,
}

impl Action {
    /// The permission bit for this action within a 3-bit nibble.
    pub fn bit(self) -> u16 {
        match self {
            Action::Read => 4,
            Action::Write => 2,
            Action::Execute => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
            Action::Execute => "execute",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The acting principal presented to every guarded operation.
///
/// The kernel never authenticates an identity itself; authentication is the
/// caller's responsibility (console session, CLI, tests). Identities are
/// passed explicitly into each guarded call rather than held in any global
/// state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Login name, compared against the owner field of protected objects.
    pub name: String,
    /// Group memberships, compared against the group field.
    pub groups: Vec<String>,
    /// Primary group, counted as a membership for nibble selection.
    pub primary_group: String,
    /// Administrators bypass all permission checks.
    pub is_admin: bool,
}

impl Identity {
    /// Create a regular (non-admin) identity.
    pub fn new(
        name: impl Into<String>,
        groups: Vec<String>,
        primary_group: impl Into<String>,
    ) -> Self {
        Identity {
            name: name.into(),
            groups,
            primary_group: primary_group.into(),
            is_admin: false,
        }
    }

    /// Create an administrative identity that bypasses the guard.
    pub fn admin(name: impl Into<String>) -> Self {
        let name = name.into();
        Identity {
            primary_group: name.clone(),
            name,
            groups: Vec::new(),
            is_admin: true,
        }
    }

    fn in_group(&self, group: &str) -> bool {
        self.primary_group == group || self.groups.iter().any(|g| g == group)
    }
}

/// A 9-bit owner/group/other permission mode.
///
/// Accepted input shapes mirror the on-disk formats: a 3-digit octal integer
/// (`760`), the same as a string (`"760"`), or a 9-character triad string
/// (`"rwxrw----"`). Anything else is an [`PermsError::InvalidMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode(u16);

impl Mode {
    /// Construct from a raw 9-bit value.
    pub fn from_bits(bits: u16) -> Result<Self, PermsError> {
        if bits > 0o777 {
            return Err(PermsError::InvalidMode {
                spec: format!("{bits:o}"),
            });
        }
        Ok(Mode(bits))
    }

    /// Parse a mode from a 3-digit decimal-written octal number, e.g. `760`.
    ///
    /// The decimal digits are read as octal digits, matching the historical
    /// file format where `"permissions": 760` means `0o760`.
    pub fn from_octal_digits(n: u32) -> Result<Self, PermsError> {
        let spec = n.to_string();
        if spec.len() > 3 {
            return Err(PermsError::InvalidMode { spec });
        }
        Self::parse_octal_str(&spec)
    }

    /// Parse a mode from its string form: either 3 octal digits or a
    /// 9-character `rwx` triad.
    pub fn parse(spec: &str) -> Result<Self, PermsError> {
        match spec.len() {
            1..=3 => Self::parse_octal_str(spec),
            9 => Self::parse_triad(spec),
            _ => Err(PermsError::InvalidMode { spec: spec.into() }),
        }
    }

    fn parse_octal_str(spec: &str) -> Result<Self, PermsError> {
        let bits = u16::from_str_radix(spec, 8).map_err(|_| PermsError::InvalidMode {
            spec: spec.to_string(),
        })?;
        Self::from_bits(bits)
    }

    fn parse_triad(spec: &str) -> Result<Self, PermsError> {
        let chars: Vec<char> = spec.chars().collect();
        if chars.len() != 9 {
            return Err(PermsError::InvalidMode { spec: spec.into() });
        }
        let mut bits: u16 = 0;
        for (i, chunk) in chars.chunks(3).enumerate() {
            let mut nibble: u16 = 0;
            for (j, (&c, expect)) in chunk.iter().zip(['r', 'w', 'x']).enumerate() {
                if c == expect {
                    nibble |= 4 >> j;
                } else if c != '-' {
                    return Err(PermsError::InvalidMode { spec: spec.into() });
                }
            }
            bits |= nibble << (6 - i * 3);
        }
        Ok(Mode(bits))
    }

    /// The canonical 0..=0o777 value.
    pub fn bits(self) -> u16 {
        self.0
    }

    /// The 3-digit octal string used by the persisted record formats.
    pub fn octal_string(self) -> String {
        format!("{:03o}", self.0)
    }

    /// The 9-character `rwxr-x---` rendering.
    pub fn triad(self) -> String {
        let mut out = String::with_capacity(9);
        for shift in [6u16, 3, 0] {
            let nibble = (self.0 >> shift) & 7;
            out.push(if nibble & 4 != 0 { 'r' } else { '-' });
            out.push(if nibble & 2 != 0 { 'w' } else { '-' });
            out.push(if nibble & 1 != 0 { 'x' } else { '-' });
        }
        out
    }

    fn nibble(self, shift: u16) -> u16 {
        (self.0 >> shift) & 7
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.triad())
    }
}

/// Implemented by objects the guard can protect: anything carrying an owner,
/// a group and a [`Mode`].
pub trait Protected {
    fn owner(&self) -> &str;
    fn group(&self) -> &str;
    fn mode(&self) -> Mode;

    /// Human-readable description used in denial messages, e.g.
    /// `host 'web1'` or `user manager`.
    fn describe(&self) -> String;
}

/// Returns whether `identity` may perform `action` on `entity`.
///
/// Nibble selection is exclusive: an owner match uses the owner nibble only,
/// a group match the group nibble, everyone else the other nibble.
/// Administrators always pass.
pub fn allows(identity: &Identity, entity: &impl Protected, action: Action) -> bool {
    if identity.is_admin {
        return true;
    }
    let mode = entity.mode();
    let nibble = if identity.name == entity.owner() {
        mode.nibble(6)
    } else if identity.in_group(entity.group()) {
        mode.nibble(3)
    } else {
        mode.nibble(0)
    };
    nibble & action.bit() != 0
}

/// Check that `identity` may perform `action` on `entity`, failing with a
/// [`PermsError::AccessDenied`] that names the identity, the entity and the
/// exact action attempted.
pub fn check(identity: &Identity, entity: &impl Protected, action: Action) -> Result<(), PermsError> {
    if allows(identity, entity, action) {
        Ok(())
    } else {
        Err(PermsError::AccessDenied {
            identity: identity.name.clone(),
            entity: entity.describe(),
            action,
        })
    }
}
