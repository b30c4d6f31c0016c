//! The permission matrix: fixed domains plus a mutable status/role binding.

use crate::types::{ActionList, Binding, DefaultPolicy, RoleTable};
use rolegate_types::MatrixError;
use std::collections::HashSet;

/// Maps (status, role) pairs to the actions that role may perform.
///
/// The status, role and action ranges are fixed at construction. Cells that
/// were never configured resolve through [`DefaultPolicy`]; a cleared cell
/// is an explicit empty list and ignores the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionMatrix {
    statuses: Vec<String>,
    roles: Vec<String>,
    actions: Vec<String>,
    default_policy: DefaultPolicy,
    binding: Binding,
}

impl PermissionMatrix {
    /// Create a matrix where every declared status/role cell is unset.
    pub fn new<S, R, A>(
        statuses: impl IntoIterator<Item = S>,
        roles: impl IntoIterator<Item = R>,
        actions: impl IntoIterator<Item = A>,
        default_policy: DefaultPolicy,
    ) -> Self
    where
        S: Into<String>,
        R: Into<String>,
        A: Into<String>,
    {
        let statuses: Vec<String> = statuses.into_iter().map(Into::into).collect();
        let roles: Vec<String> = roles.into_iter().map(Into::into).collect();
        let actions: Vec<String> = actions.into_iter().map(Into::into).collect();
        let binding = skeleton(&statuses, &roles);

        tracing::debug!(
            statuses = statuses.len(),
            roles = roles.len(),
            actions = actions.len(),
            policy = default_policy.as_str(),
            "Created permission matrix"
        );

        Self {
            statuses,
            roles,
            actions,
            default_policy,
            binding,
        }
    }

    /// Create a matrix whose binding is taken verbatim from `snapshot`.
    ///
    /// No skeleton is generated and the snapshot is not checked against the
    /// declared ranges.
    pub fn from_snapshot<S, R, A>(
        statuses: impl IntoIterator<Item = S>,
        roles: impl IntoIterator<Item = R>,
        actions: impl IntoIterator<Item = A>,
        default_policy: DefaultPolicy,
        snapshot: Binding,
    ) -> Self
    where
        S: Into<String>,
        R: Into<String>,
        A: Into<String>,
    {
        let matrix = Self {
            statuses: statuses.into_iter().map(Into::into).collect(),
            roles: roles.into_iter().map(Into::into).collect(),
            actions: actions.into_iter().map(Into::into).collect(),
            default_policy,
            binding: snapshot,
        };

        tracing::debug!(
            statuses = matrix.statuses.len(),
            snapshot_statuses = matrix.binding.len(),
            policy = default_policy.as_str(),
            "Restored permission matrix from snapshot"
        );

        matrix
    }

    /// Re-initialize the binding: install `snapshot`, or reset every
    /// declared cell to unset when none is given.
    pub fn reset(&mut self, snapshot: Option<Binding>) -> &mut Self {
        self.binding = match snapshot {
            Some(binding) => binding,
            None => skeleton(&self.statuses, &self.roles),
        };
        self
    }

    pub fn statuses(&self) -> &[String] {
        &self.statuses
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    pub fn default_policy(&self) -> DefaultPolicy {
        self.default_policy
    }

    pub fn allow_all_by_default(&self) -> bool {
        self.default_policy.allows_all()
    }

    pub fn deny_all_by_default(&self) -> bool {
        !self.allow_all_by_default()
    }

    /// The full binding, suitable for persisting and passing back to
    /// [`PermissionMatrix::from_snapshot`].
    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// An owned copy of the binding.
    pub fn snapshot(&self) -> Binding {
        self.binding.clone()
    }

    pub fn status_exists(&self, status: &str) -> bool {
        self.statuses.iter().any(|s| s == status)
    }

    /// Currently the same check as [`PermissionMatrix::status_exists`].
    pub fn is_valid_status(&self, status: &str) -> bool {
        self.status_exists(status)
    }

    /// The raw role table for a status, without default-policy substitution.
    pub fn roles_for(&self, status: &str) -> Option<&RoleTable> {
        self.binding.get(status)
    }

    /// Resolve the actions a role may perform in a status.
    ///
    /// Unknown statuses resolve to nothing. A configured cell is returned
    /// as-is, in insertion order. An unset or missing cell resolves to the
    /// whole action range under [`DefaultPolicy::AllowAll`], else nothing.
    pub fn actions_for(&self, status: &str, role: &str) -> &[String] {
        if !self.status_exists(status) {
            return &[];
        }

        let configured = self
            .binding
            .get(status)
            .and_then(|table| table.get(role))
            .and_then(|cell| cell.as_deref());
        if let Some(actions) = configured {
            return actions;
        }

        match self.default_policy {
            DefaultPolicy::AllowAll => self.actions.as_slice(),
            DefaultPolicy::DenyAll => &[],
        }
    }

    pub fn is_allowed(&self, status: &str, role: &str, action: &str) -> bool {
        self.actions_for(status, role).iter().any(|a| a == action)
    }

    /// Set a cell (or, with `role = None`, every declared role of the
    /// status) to an explicit empty list.
    pub fn clear_actions(
        &mut self,
        status: &str,
        role: Option<&str>,
    ) -> Result<&mut Self, MatrixError> {
        let table = role_table_mut(&mut self.binding, &self.statuses, status)?;
        match role {
            Some(role) => match table.get_mut(role) {
                Some(cell) => *cell = Some(Vec::new()),
                None => tracing::debug!(status, role, "Role not bound to status, nothing to clear"),
            },
            None => {
                for role in &self.roles {
                    if let Some(cell) = table.get_mut(role) {
                        *cell = Some(Vec::new());
                    }
                }
            }
        }
        Ok(self)
    }

    /// Replace a cell with exactly the given actions. Duplicates are kept.
    pub fn set_only(
        &mut self,
        status: &str,
        role: &str,
        actions: impl Into<ActionList>,
    ) -> Result<&mut Self, MatrixError> {
        let table = role_table_mut(&mut self.binding, &self.statuses, status)?;
        match table.get_mut(role) {
            Some(cell) => *cell = Some(actions.into().into_vec()),
            None => tracing::debug!(status, role, "Role not bound to status, ignoring set"),
        }
        Ok(self)
    }

    /// Merge actions into a cell, then drop duplicates keeping the first
    /// occurrence of each. An unset cell starts from empty.
    pub fn append_actions(
        &mut self,
        status: &str,
        role: &str,
        actions: impl Into<ActionList>,
    ) -> Result<&mut Self, MatrixError> {
        let table = role_table_mut(&mut self.binding, &self.statuses, status)?;
        append_to_cell(table, status, role, actions.into().as_slice());
        Ok(self)
    }

    /// [`PermissionMatrix::append_actions`] for every declared role of the status.
    pub fn append_actions_for_all_roles(
        &mut self,
        status: &str,
        actions: impl Into<ActionList>,
    ) -> Result<&mut Self, MatrixError> {
        let actions = actions.into();
        let table = role_table_mut(&mut self.binding, &self.statuses, status)?;
        for role in &self.roles {
            append_to_cell(table, status, role, actions.as_slice());
        }
        Ok(self)
    }

    /// Remove every occurrence of each given action from a cell.
    ///
    /// An unset cell stays unset.
    pub fn unbind_actions(
        &mut self,
        status: &str,
        role: &str,
        actions: impl Into<ActionList>,
    ) -> Result<&mut Self, MatrixError> {
        let actions = actions.into();
        let table = role_table_mut(&mut self.binding, &self.statuses, status)?;
        match table.get_mut(role) {
            Some(Some(list)) => list.retain(|a| !actions.as_slice().contains(a)),
            Some(None) => tracing::debug!(status, role, "Cell is unset, nothing to unbind"),
            None => tracing::debug!(status, role, "Role not bound to status, ignoring unbind"),
        }
        Ok(self)
    }
}

/// Every status mapped to every role, all cells unset.
fn skeleton(statuses: &[String], roles: &[String]) -> Binding {
    statuses
        .iter()
        .map(|status| {
            let table: RoleTable = roles.iter().map(|role| (role.clone(), None)).collect();
            (status.clone(), table)
        })
        .collect()
}

/// Look up the role table of a declared status for mutation.
fn role_table_mut<'a>(
    binding: &'a mut Binding,
    statuses: &[String],
    status: &str,
) -> Result<&'a mut RoleTable, MatrixError> {
    let declared = statuses.iter().any(|s| s == status);
    match binding.get_mut(status) {
        Some(table) if declared => Ok(table),
        _ => {
            tracing::warn!(status, "Rejected mutation of unknown status");
            Err(MatrixError::UnknownStatus {
                status: status.to_string(),
            })
        }
    }
}

fn append_to_cell(table: &mut RoleTable, status: &str, role: &str, actions: &[String]) {
    let Some(cell) = table.get_mut(role) else {
        tracing::debug!(status, role, "Role not bound to status, ignoring append");
        return;
    };
    let list = cell.get_or_insert_with(Vec::new);
    list.extend(actions.iter().cloned());

    let mut seen = HashSet::with_capacity(list.len());
    list.retain(|a| seen.insert(a.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTIONS: [&str; 6] = ["publish", "send", "cancel", "query", "accept", "reject"];

    fn matrix(policy: DefaultPolicy) -> PermissionMatrix {
        PermissionMatrix::new(["created", "sent"], ["owner", "partner"], ACTIONS, policy)
    }

    #[test]
    fn test_fresh_matrix_deny_all() {
        let m = matrix(DefaultPolicy::DenyAll);
        for status in ["created", "sent"] {
            for role in ["owner", "partner"] {
                assert!(m.actions_for(status, role).is_empty());
            }
        }
        assert!(m.deny_all_by_default());
        assert!(!m.allow_all_by_default());
    }

    #[test]
    fn test_fresh_matrix_allow_all() {
        let m = matrix(DefaultPolicy::AllowAll);
        assert_eq!(m.actions_for("sent", "partner"), m.actions());
        assert!(m.is_allowed("created", "owner", "reject"));
        assert!(!m.is_allowed("created", "owner", "delete"));
    }

    #[test]
    fn test_skeleton_marks_cells_unset() {
        let m = matrix(DefaultPolicy::DenyAll);
        let table = m.roles_for("created").unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.values().all(Option::is_none));
    }

    #[test]
    fn test_clear_overrides_allow_all() {
        let mut m = matrix(DefaultPolicy::AllowAll);
        m.clear_actions("created", Some("owner")).unwrap();
        assert!(m.actions_for("created", "owner").is_empty());
        assert_eq!(m.actions_for("created", "partner").len(), ACTIONS.len());
    }

    #[test]
    fn test_clear_every_role() {
        let mut m = matrix(DefaultPolicy::AllowAll);
        m.clear_actions("sent", None).unwrap();
        assert!(m.actions_for("sent", "owner").is_empty());
        assert!(m.actions_for("sent", "partner").is_empty());
        assert_eq!(m.roles_for("sent").unwrap()["owner"], Some(vec![]));
        // Other statuses untouched
        assert_eq!(m.actions_for("created", "owner").len(), ACTIONS.len());
    }

    #[test]
    fn test_clear_unknown_role_is_noop() {
        let mut m = matrix(DefaultPolicy::AllowAll);
        m.clear_actions("sent", Some("auditor")).unwrap();
        assert!(!m.roles_for("sent").unwrap().contains_key("auditor"));
    }

    #[test]
    fn test_set_only_preserves_order_and_duplicates() {
        let mut m = matrix(DefaultPolicy::DenyAll);
        m.set_only("created", "owner", ["send", "publish", "send"]).unwrap();
        assert_eq!(m.actions_for("created", "owner"), &["send", "publish", "send"]);
    }

    #[test]
    fn test_set_only_single_action() {
        let mut m = matrix(DefaultPolicy::AllowAll);
        m.set_only("sent", "partner", "query").unwrap();
        assert_eq!(m.actions_for("sent", "partner"), &["query"]);
        assert!(!m.is_allowed("sent", "partner", "send"));
    }

    #[test]
    fn test_set_only_unknown_role_is_noop() {
        let mut m = matrix(DefaultPolicy::DenyAll);
        let before = m.snapshot();
        m.set_only("sent", "auditor", "query").unwrap();
        assert_eq!(m.binding(), &before);
    }

    #[test]
    fn test_append_dedups_keeping_first_seen() {
        let mut m = matrix(DefaultPolicy::DenyAll);
        m.append_actions("created", "owner", ["query", "send"]).unwrap();
        m.append_actions("created", "owner", ["cancel", "query", "cancel"]).unwrap();
        assert_eq!(m.actions_for("created", "owner"), &["query", "send", "cancel"]);
    }

    #[test]
    fn test_append_to_unset_cell_ignores_default_range() {
        let mut m = matrix(DefaultPolicy::AllowAll);
        m.append_actions("created", "owner", "publish").unwrap();
        assert_eq!(m.actions_for("created", "owner"), &["publish"]);
    }

    #[test]
    fn test_append_dedups_existing_duplicates() {
        let mut m = matrix(DefaultPolicy::DenyAll);
        m.set_only("sent", "owner", ["accept", "accept"]).unwrap();
        m.append_actions("sent", "owner", "reject").unwrap();
        assert_eq!(m.actions_for("sent", "owner"), &["accept", "reject"]);
    }

    #[test]
    fn test_append_for_all_roles() {
        let mut m = matrix(DefaultPolicy::DenyAll);
        m.set_only("sent", "owner", "accept").unwrap();
        m.append_actions_for_all_roles("sent", ["query", "accept"]).unwrap();
        assert_eq!(m.actions_for("sent", "owner"), &["accept", "query"]);
        assert_eq!(m.actions_for("sent", "partner"), &["query", "accept"]);
        assert!(m.actions_for("created", "owner").is_empty());
    }

    #[test]
    fn test_unbind_removes_every_occurrence() {
        let mut m = matrix(DefaultPolicy::DenyAll);
        m.set_only("created", "owner", ["publish", "send", "publish"]).unwrap();
        m.unbind_actions("created", "owner", "publish").unwrap();
        assert_eq!(m.actions_for("created", "owner"), &["send"]);
    }

    #[test]
    fn test_unbind_several_actions() {
        let mut m = matrix(DefaultPolicy::DenyAll);
        m.set_only("created", "owner", ["publish", "send", "cancel", "query"]).unwrap();
        m.unbind_actions("created", "owner", ["cancel", "publish", "missing"]).unwrap();
        assert_eq!(m.actions_for("created", "owner"), &["send", "query"]);
    }

    #[test]
    fn test_unbind_unset_cell_stays_unset() {
        let mut m = matrix(DefaultPolicy::AllowAll);
        m.unbind_actions("created", "owner", "publish").unwrap();
        assert_eq!(m.roles_for("created").unwrap()["owner"], None);
        assert!(m.is_allowed("created", "owner", "publish"));
    }

    #[test]
    fn test_mutators_chain() {
        let mut m = matrix(DefaultPolicy::DenyAll);
        m.set_only("created", "owner", ["publish", "send"])
            .and_then(|m| m.append_actions("created", "owner", "cancel"))
            .and_then(|m| m.unbind_actions("created", "owner", "send"))
            .unwrap();
        assert_eq!(m.actions_for("created", "owner"), &["publish", "cancel"]);
    }

    #[test]
    fn test_mutating_unknown_status_is_rejected() {
        let mut m = matrix(DefaultPolicy::DenyAll);
        let before = m.snapshot();

        let err = m.clear_actions("archived", None).unwrap_err();
        assert!(matches!(err, MatrixError::UnknownStatus { ref status } if status == "archived"));
        assert!(m.set_only("archived", "owner", "query").is_err());
        assert!(m.append_actions("archived", "owner", "query").is_err());
        assert!(m.append_actions_for_all_roles("archived", "query").is_err());
        assert!(m.unbind_actions("archived", "owner", "query").is_err());
        assert_eq!(m.binding(), &before);
    }

    #[test]
    fn test_unknown_status_queries() {
        let m = matrix(DefaultPolicy::AllowAll);
        assert!(!m.status_exists("archived"));
        assert!(!m.is_valid_status("archived"));
        assert!(m.status_exists("sent"));
        assert!(m.is_valid_status("sent"));
        assert!(m.actions_for("archived", "owner").is_empty());
        assert!(!m.is_allowed("archived", "owner", "publish"));
        assert!(m.roles_for("archived").is_none());
    }

    #[test]
    fn test_unknown_role_uses_default_policy() {
        let allow = matrix(DefaultPolicy::AllowAll);
        assert_eq!(allow.actions_for("created", "auditor"), allow.actions());
        let deny = matrix(DefaultPolicy::DenyAll);
        assert!(deny.actions_for("created", "auditor").is_empty());
    }

    #[test]
    fn test_from_snapshot_installs_binding_verbatim() {
        let mut snapshot = Binding::new();
        snapshot.insert("archived".into(), RoleTable::from([("owner".into(), None)]));
        let m = PermissionMatrix::from_snapshot(
            ["created", "sent"],
            ["owner", "partner"],
            ACTIONS,
            DefaultPolicy::DenyAll,
            snapshot.clone(),
        );
        assert_eq!(m.binding(), &snapshot);
        assert_eq!(m.statuses(), &["created", "sent"]);
        assert_eq!(m.roles(), &["owner", "partner"]);
        assert_eq!(m.actions(), &ACTIONS);
        assert!(m.roles_for("created").is_none());
    }

    #[test]
    fn test_snapshot_missing_status_table() {
        let mut snapshot = Binding::new();
        snapshot.insert("created".into(), RoleTable::new());
        let mut m = PermissionMatrix::from_snapshot(
            ["created", "sent"],
            ["owner"],
            ACTIONS,
            DefaultPolicy::AllowAll,
            snapshot,
        );
        // Declared but absent from the snapshot: queries fall back, mutations fail
        assert_eq!(m.actions_for("sent", "owner").len(), ACTIONS.len());
        assert!(m.roles_for("sent").is_none());
        assert!(m.set_only("sent", "owner", "query").is_err());
        // Empty role table: role is not bound, set is a no-op
        m.set_only("created", "owner", "query").unwrap();
        assert_eq!(m.actions_for("created", "owner").len(), ACTIONS.len());
    }

    #[test]
    fn test_reset_restores_skeleton() {
        let mut m = matrix(DefaultPolicy::DenyAll);
        m.set_only("created", "owner", "publish").unwrap();
        m.reset(None);
        assert_eq!(m.binding(), matrix(DefaultPolicy::DenyAll).binding());
    }

    #[test]
    fn test_reset_installs_snapshot() {
        let mut source = matrix(DefaultPolicy::DenyAll);
        source.set_only("sent", "partner", "query").unwrap();

        let mut m = matrix(DefaultPolicy::DenyAll);
        m.reset(Some(source.snapshot()));
        assert_eq!(m.actions_for("sent", "partner"), &["query"]);
    }

    #[test]
    fn test_empty_ranges_are_degenerate() {
        let m = PermissionMatrix::new(
            Vec::<String>::new(),
            Vec::<String>::new(),
            Vec::<String>::new(),
            DefaultPolicy::AllowAll,
        );
        assert!(m.binding().is_empty());
        assert!(m.actions_for("created", "owner").is_empty());
        assert!(!m.is_allowed("created", "owner", "publish"));
    }
}
