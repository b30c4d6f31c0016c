//! Plain-text rendering of matrix contents.

use rolegate_matrix::PermissionMatrix;
use std::fmt::Write;

/// Format a raw cell: `<unset>`, `[]`, or a comma-separated list.
pub fn format_cell(cell: Option<&[String]>) -> String {
    match cell {
        None => "<unset>".to_string(),
        Some([]) => "[]".to_string(),
        Some(actions) => actions.join(", "),
    }
}

/// Raw role table of one status, one `role: cell` line per role.
///
/// Declared roles come first in declaration order, followed by any extra
/// roles a snapshot carried.
pub fn format_roles(matrix: &PermissionMatrix, status: &str) -> Option<String> {
    let table = matrix.roles_for(status)?;
    let mut out = String::new();
    for role in matrix.roles() {
        if let Some(cell) = table.get(role) {
            let _ = writeln!(out, "{role}: {}", format_cell(cell.as_deref()));
        }
    }
    for (role, cell) in table {
        if !matrix.roles().contains(role) {
            let _ = writeln!(out, "{role}: {}", format_cell(cell.as_deref()));
        }
    }
    Some(out)
}

/// Every declared status/role pair with its resolved actions.
pub fn format_matrix(matrix: &PermissionMatrix) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "default policy: {}", matrix.default_policy().as_str());
    for status in matrix.statuses() {
        let _ = writeln!(out, "[{status}]");
        for role in matrix.roles() {
            let actions = matrix.actions_for(status, role);
            let _ = writeln!(out, "  {role}: {}", format_cell(Some(actions)));
        }
    }
    out
}
