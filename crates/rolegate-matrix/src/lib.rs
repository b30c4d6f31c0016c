//! Permission matrix engine for rolegate.
//!
//! Answers "may role R perform action A while the subject is in status S?"
//! and supports incremental edits: set-only / append / unbind / clear.
//! Unconfigured cells fall back to the matrix's default policy.

pub mod matrix;
pub mod template;
pub mod types;

pub use matrix::PermissionMatrix;
pub use template::MatrixTemplate;
pub use types::*;
