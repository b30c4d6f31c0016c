//! Template trait for matrices with a fixed shape and built-in bindings.

use crate::matrix::PermissionMatrix;
use crate::types::{Binding, DefaultPolicy};
use rolegate_types::MatrixError;

/// A reusable matrix definition.
///
/// Implementors declare the three ranges and the default policy, and may
/// configure bindings in [`MatrixTemplate::configure`]. The hook only runs
/// when the matrix is not restored from a snapshot.
pub trait MatrixTemplate {
    fn statuses(&self) -> Vec<String>;

    fn roles(&self) -> Vec<String>;

    fn actions(&self) -> Vec<String>;

    fn default_policy(&self) -> DefaultPolicy {
        DefaultPolicy::AllowAll
    }

    /// Populate bindings on a freshly created matrix. Does nothing by default.
    fn configure(&self, _matrix: &mut PermissionMatrix) -> Result<(), MatrixError> {
        Ok(())
    }
}

impl PermissionMatrix {
    /// Build a matrix from a template, restoring `snapshot` if given and
    /// running the template's `configure` hook otherwise.
    pub fn from_template<T: MatrixTemplate + ?Sized>(
        template: &T,
        snapshot: Option<Binding>,
    ) -> Result<Self, MatrixError> {
        let statuses = template.statuses();
        let roles = template.roles();
        let actions = template.actions();
        let policy = template.default_policy();

        match snapshot {
            Some(binding) => Ok(Self::from_snapshot(statuses, roles, actions, policy, binding)),
            None => {
                let mut matrix = Self::new(statuses, roles, actions, policy);
                template.configure(&mut matrix)?;
                Ok(matrix)
            }
        }
    }
}
