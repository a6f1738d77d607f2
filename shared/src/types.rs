//! Core shared types and identifiers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for one invocation's batch of work
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(Uuid);

impl BatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, enough to tell runs apart in logs
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of one alias
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasStatus {
    Pending,
    Success,
    Failed,
}

impl AliasStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AliasStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AliasStatus::Pending => "pending",
            AliasStatus::Success => "success",
            AliasStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for AliasStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One alias: the unit of work and the unit of export
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status: AliasStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl AliasRecord {
    /// New in-memory record, created before the remote call is made
    pub fn pending(address: impl Into<String>, theme: Option<&str>) -> Self {
        Self {
            address: address.into(),
            rule_id: None,
            created_at: Utc::now(),
            status: AliasStatus::Pending,
            error: None,
            theme: theme.map(str::to_string),
            password: None,
        }
    }

    /// Apply the single terminal response for this record.
    ///
    /// Returns `false` and leaves the record untouched when it already
    /// reached a terminal state.
    pub fn complete(&mut self, outcome: Result<String, &GatewayFailure>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        match outcome {
            Ok(rule_id) => {
                self.rule_id = Some(rule_id);
                self.status = AliasStatus::Success;
            }
            Err(failure) => {
                self.error = Some(failure.to_string());
                self.status = AliasStatus::Failed;
            }
        }
        true
    }

    pub fn is_success(&self) -> bool {
        self.status == AliasStatus::Success
    }

    pub fn has_password(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Local part of the address (everything before `@`)
    pub fn local_part(&self) -> &str {
        self.address
            .split_once('@')
            .map(|(local, _)| local)
            .unwrap_or(&self.address)
    }
}

/// Address paired with a freshly generated secret
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    pub address: String,
    pub password: String,
}

impl CredentialPair {
    pub fn new(address: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            password: password.into(),
        }
    }
}

/// Remote forwarding rule as reported by the provider's listing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSummary {
    pub rule_id: String,
    pub address: String,
    #[serde(default)]
    pub enabled: bool,
}

/// Failure reasons for remote rule requests
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayFailure {
    /// Provider throttled the request (HTTP 429)
    #[error("rate limited: {0}")]
    RateLimited(String),
    /// Provider-side failure (HTTP 5xx)
    #[error("server error {status}: {message}")]
    ServerError { status: u16, message: String },
    /// Connection reset, refused or timed out
    #[error("network error: {0}")]
    Network(String),
    /// Token rejected (HTTP 401/403)
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Any other well-formed rejection (HTTP 4xx)
    #[error("rejected {status}: {message}")]
    Rejected { status: u16, message: String },
    /// Response body did not have the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl GatewayFailure {
    /// Transient failures are worth retrying; everything else is fatal
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayFailure::RateLimited(_) | GatewayFailure::ServerError { .. } | GatewayFailure::Network(_)
        )
    }

    /// Classify an HTTP status plus the provider's error text
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 => GatewayFailure::RateLimited(message),
            401 | 403 => GatewayFailure::Unauthorized(message),
            500..=599 => GatewayFailure::ServerError { status, message },
            _ => GatewayFailure::Rejected { status, message },
        }
    }
}
