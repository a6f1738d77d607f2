//! aliasctl error types

use std::path::PathBuf;

use shared::{GatewayFailure, SharedError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AliasctlError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error(transparent)]
    Shared(#[from] SharedError),

    #[error("Gateway request failed during {operation}: {failure}")]
    Gateway { operation: String, failure: GatewayFailure },

    #[error("Snapshot {path} is unreadable: {reason}")]
    SnapshotCorrupt { path: PathBuf, reason: String },

    #[error("Prompt failed: {message}")]
    Prompt { message: String },

    #[error("Operation aborted by user")]
    Aborted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AliasctlError {
    pub fn config(message: impl Into<String>) -> Self {
        AliasctlError::ConfigError {
            message: message.into(),
        }
    }

    pub fn gateway(operation: impl Into<String>, failure: GatewayFailure) -> Self {
        AliasctlError::Gateway {
            operation: operation.into(),
            failure,
        }
    }

    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        AliasctlError::SnapshotCorrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<inquire::InquireError> for AliasctlError {
    fn from(err: inquire::InquireError) -> Self {
        match err {
            inquire::InquireError::OperationCanceled | inquire::InquireError::OperationInterrupted => {
                AliasctlError::Aborted
            }
            other => AliasctlError::Prompt {
                message: other.to_string(),
            },
        }
    }
}

pub type AliasctlResult<T> = Result<T, AliasctlError>;
