//! TOML matrix definitions for rolegate.
//!
//! A definition file declares the status, role and action ranges, the
//! default policy, and an optional `[bindings.<status>]` table per status.
//!
//! File location precedence: `--config` flag > `ROLEGATE_CONFIG` >
//! `<config dir>/matrix.toml`.

use rolegate_matrix::{Binding, DefaultPolicy, MatrixTemplate, PermissionMatrix};
use rolegate_types::{ConfigError, MatrixError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// File name looked up inside the config directory.
pub const DEFAULT_CONFIG_FILE: &str = "matrix.toml";

/// Raw contents of a definition file, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefinitionFile {
    pub statuses: Option<Vec<String>>,
    pub roles: Option<Vec<String>>,
    pub actions: Option<Vec<String>>,
    #[serde(default)]
    pub default_policy: DefaultPolicy,
    #[serde(default)]
    pub bindings: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

/// A validated matrix definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixDefinition {
    pub statuses: Vec<String>,
    pub roles: Vec<String>,
    pub actions: Vec<String>,
    pub default_policy: DefaultPolicy,
    /// status -> role -> actions, applied with `set_only`.
    pub bindings: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl MatrixDefinition {
    /// Read and validate a definition file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let definition = Self::from_toml_str(&content, &path.display().to_string())?;
        tracing::debug!(
            path = %path.display(),
            statuses = definition.statuses.len(),
            "Loaded matrix definition"
        );
        Ok(definition)
    }

    /// Parse and validate definition TOML. `origin` is only used in errors.
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let file: DefinitionFile = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        Self::try_from(file)
    }

    /// Build a matrix with the definition's bindings applied.
    pub fn build(&self) -> Result<PermissionMatrix, MatrixError> {
        PermissionMatrix::from_template(self, None)
    }

    /// Build a matrix restored from a snapshot. The bindings table is ignored.
    pub fn build_with_snapshot(&self, snapshot: Binding) -> PermissionMatrix {
        PermissionMatrix::from_snapshot(
            self.statuses.clone(),
            self.roles.clone(),
            self.actions.clone(),
            self.default_policy,
            snapshot,
        )
    }
}

impl TryFrom<DefinitionFile> for MatrixDefinition {
    type Error = ConfigError;

    fn try_from(file: DefinitionFile) -> Result<Self, Self::Error> {
        let statuses = required_range(file.statuses, "statuses")?;
        let roles = required_range(file.roles, "roles")?;
        let actions = required_range(file.actions, "actions")?;

        for (status, table) in &file.bindings {
            if !statuses.contains(status) {
                return Err(ConfigError::InvalidValue {
                    key: format!("bindings.{status}"),
                    message: "status is not declared in `statuses`".into(),
                });
            }
            for role in table.keys() {
                if !roles.contains(role) {
                    return Err(ConfigError::InvalidValue {
                        key: format!("bindings.{status}.{role}"),
                        message: "role is not declared in `roles`".into(),
                    });
                }
            }
        }

        Ok(Self {
            statuses,
            roles,
            actions,
            default_policy: file.default_policy,
            bindings: file.bindings,
        })
    }
}

impl MatrixTemplate for MatrixDefinition {
    fn statuses(&self) -> Vec<String> {
        self.statuses.clone()
    }

    fn roles(&self) -> Vec<String> {
        self.roles.clone()
    }

    fn actions(&self) -> Vec<String> {
        self.actions.clone()
    }

    fn default_policy(&self) -> DefaultPolicy {
        self.default_policy
    }

    fn configure(&self, matrix: &mut PermissionMatrix) -> Result<(), MatrixError> {
        for (status, table) in &self.bindings {
            for (role, actions) in table {
                matrix.set_only(status, role, actions.as_slice())?;
            }
        }
        Ok(())
    }
}

fn required_range(range: Option<Vec<String>>, key: &str) -> Result<Vec<String>, ConfigError> {
    let range = range.ok_or_else(|| ConfigError::MissingKey { key: key.into() })?;
    let duplicate = {
        let mut seen = HashSet::new();
        range.iter().find(|id| !seen.insert(id.as_str())).cloned()
    };
    if let Some(dup) = duplicate {
        return Err(ConfigError::InvalidValue {
            key: key.into(),
            message: format!("duplicate entry '{dup}'"),
        });
    }
    Ok(range)
}

/// Get the rolegate config directory path (~/.rolegate/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ROLEGATE_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rolegate")
}

/// Resolve which definition file to load.
pub fn resolve_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    resolve_from(
        cli_path,
        std::env::var("ROLEGATE_CONFIG").ok(),
        config_dir(),
    )
}

fn resolve_from(cli_path: Option<PathBuf>, env_path: Option<String>, dir: PathBuf) -> PathBuf {
    cli_path
        .or_else(|| env_path.filter(|p| !p.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| dir.join(DEFAULT_CONFIG_FILE))
}
