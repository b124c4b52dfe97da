//! Unified error type for the recovery-planning ecosystem.
//!
//! [`CoreError`] represents every error a consumer of `recovery-core`
//! can hit: malformed or inconsistent input, and wrapping of lower-level
//! I/O/parse failures at the edges. Domain-specific solver errors live
//! in `recovery-solver` and convert into `anyhow::Error` at the CLI
//! boundary rather than into this type, since the core has no solver
//! dependency.

use thiserror::Error;

/// Unified error type for `recovery-core` operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// I/O errors (file access, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("parse error: {0}")]
    Parse(String),

    /// Data validation errors — see [`crate::diagnostics::Diagnostics`]
    /// for the eager/total collection of these prior to raising.
    #[error("validation error: {0}")]
    Validation(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using [`CoreError`].
pub type CoreResult<T> = Result<T, CoreError>;

impl From<String> for CoreError {
    fn from(s: String) -> Self {
        CoreError::Other(s)
    }
}

impl From<&str> for CoreError {
    fn from(s: &str) -> Self {
        CoreError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Parse(err.to_string())
    }
}
