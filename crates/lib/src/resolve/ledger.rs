use std::fmt;

use crate::model::ModelError;

/// One non-fatal problem recorded while resolving a host.
///
/// Issues never abort resolution: the offending binding (or member, or
/// grant) is skipped and the rest of the host is still built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    /// A binding referenced a user missing from the valid user list.
    UnresolvedUser { name: String, context: String },
    /// A binding referenced a group missing from the valid group list.
    UnresolvedGroup { name: String, context: String },
    /// A host included a category that is not defined.
    UnknownCategory { kind: &'static str, name: String },
    /// A record inside the host definition failed validation.
    InvalidRecord { message: String },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::UnresolvedUser { name, context } => {
                write!(
                    f,
                    "user '{name}' was not found in the valid users list ({context})"
                )
            }
            Issue::UnresolvedGroup { name, context } => {
                write!(
                    f,
                    "group '{name}' was not found in the valid groups list ({context})"
                )
            }
            Issue::UnknownCategory { kind, name } => {
                write!(f, "{kind} '{name}' does not exist")
            }
            Issue::InvalidRecord { message } => f.write_str(message),
        }
    }
}

impl From<ModelError> for Issue {
    fn from(err: ModelError) -> Self {
        Issue::InvalidRecord {
            message: err.to_string(),
        }
    }
}

/// The error ledger accumulated while resolving one host.
///
/// The ledger travels with the host inside the host manager so callers (and
/// the exporter) can inspect what was skipped, replacing the old pattern of
/// threading mutable error arrays through every call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    issues: Vec<Issue>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger::default()
    }

    pub fn record(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        self.issues.extend(issues);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Formatted messages, for display and for bulk-load reports.
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(Issue::to_string).collect()
    }
}

impl IntoIterator for Ledger {
    type Item = Issue;
    type IntoIter = std::vec::IntoIter<Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.into_iter()
    }
}
