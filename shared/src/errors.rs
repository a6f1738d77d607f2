//! Shared error types for the workspace

use thiserror::Error;

/// Structural failures that abort a whole operation rather than one item
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SharedError {
    #[error("Capacity exhausted: {what} after {attempts} attempts")]
    CapacityExhausted { what: String, attempts: u32 },

    #[error("Invalid parameter: {field} = {value} ({reason})")]
    InvalidParameter {
        field: String,
        value: String,
        reason: String,
    },
}

impl SharedError {
    pub fn capacity(what: impl Into<String>, attempts: u32) -> Self {
        SharedError::CapacityExhausted {
            what: what.into(),
            attempts,
        }
    }

    pub fn invalid(field: impl Into<String>, value: impl ToString, reason: impl Into<String>) -> Self {
        SharedError::InvalidParameter {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

pub type SharedResult<T> = Result<T, SharedError>;
