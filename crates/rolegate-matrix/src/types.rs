//! Core types for the permission matrix.

use rolegate_types::MatrixError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-status role table: role -> action list.
///
/// `None` marks a cell that was never configured and resolves through the
/// default policy. `Some(vec![])` is an explicit "no actions".
pub type RoleTable = BTreeMap<String, Option<Vec<String>>>;

/// The full status -> role -> actions mapping. Also the snapshot format.
pub type Binding = BTreeMap<String, RoleTable>;

/// What an unconfigured status/role cell resolves to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultPolicy {
    /// Every declared action is allowed.
    #[default]
    AllowAll,
    /// No action is allowed.
    DenyAll,
}

impl DefaultPolicy {
    pub fn from_allow_all(allow_all: bool) -> Self {
        if allow_all {
            Self::AllowAll
        } else {
            Self::DenyAll
        }
    }

    pub fn allows_all(self) -> bool {
        self == Self::AllowAll
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AllowAll => "allow_all",
            Self::DenyAll => "deny_all",
        }
    }
}

/// Actions passed to a mutator: either a single action or a sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionList(Vec<String>);

impl ActionList {
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ActionList {
    fn from(action: &str) -> Self {
        Self(vec![action.to_string()])
    }
}

impl From<String> for ActionList {
    fn from(action: String) -> Self {
        Self(vec![action])
    }
}

impl From<Vec<String>> for ActionList {
    fn from(actions: Vec<String>) -> Self {
        Self(actions)
    }
}

impl From<Vec<&str>> for ActionList {
    fn from(actions: Vec<&str>) -> Self {
        Self(actions.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for ActionList {
    fn from(actions: &[&str]) -> Self {
        Self(actions.iter().map(|a| a.to_string()).collect())
    }
}

impl From<&[String]> for ActionList {
    fn from(actions: &[String]) -> Self {
        Self(actions.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for ActionList {
    fn from(actions: [&str; N]) -> Self {
        Self(actions.iter().map(|a| a.to_string()).collect())
    }
}

/// Serialize a binding as pretty JSON.
pub fn snapshot_to_json(binding: &Binding) -> Result<String, MatrixError> {
    Ok(serde_json::to_string_pretty(binding)?)
}

/// Parse a binding from JSON. Unset cells are `null`.
pub fn snapshot_from_json(json: &str) -> Result<Binding, MatrixError> {
    Ok(serde_json::from_str(json)?)
}
