use std::fmt;

use serde::{Deserialize, Serialize};

use super::ModelError;

/// Lifecycle state of an entity or binding.
///
/// The transition of interest is `present` to `absent`: an absent entity is
/// kept in the store (so its removal can still be exported and audited) but
/// is no longer treated as active. Re-entering `present` is allowed and is a
/// fresh transition, not a reversal with history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    #[default]
    Present,
    Absent,
}

impl Presence {
    pub fn is_present(self) -> bool {
        matches!(self, Presence::Present)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Presence::Present => "present",
            Presence::Absent => "absent",
        }
    }

    /// Parse a state value from a record. Anything other than `present` or
    /// `absent` is a validation error; a missing value defaults to present
    /// at the call sites.
    pub fn parse(value: &str) -> Result<Self, ModelError> {
        match value {
            "present" => Ok(Presence::Present),
            "absent" => Ok(Presence::Absent),
            other => Err(ModelError::InvalidState {
                value: other.to_string(),
            }),
        }
    }

    /// Merge two states. Absence is sticky: the result is absent if either
    /// side is absent, regardless of order.
    pub fn merged(self, other: Presence) -> Presence {
        if self.is_present() && other.is_present() {
            Presence::Present
        } else {
            Presence::Absent
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
