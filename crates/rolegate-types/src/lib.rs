//! Shared error hierarchy for rolegate.

pub mod error;

pub use error::{ConfigError, MatrixError, RolegateError};
