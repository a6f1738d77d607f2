//! Trait definitions with mockall annotations for testing
//!
//! The gateway and the snapshot store are the two seams the batch workflows
//! depend on; both are injected so the workflows can run against mocks.

use shared::{AliasRecord, CredentialPair, GatewayFailure, RuleSummary};

use crate::error::AliasctlResult;
use crate::services::export::{MergeSummary, ReportSection};

/// Outcome of a token verification call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStatus {
    pub id: String,
    pub status: String,
}

impl TokenStatus {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}

/// Remote email-routing rule operations
///
/// Every call reports either a value or a [`GatewayFailure`] whose
/// `is_transient()` decides whether the retry policy tries again.
#[mockall::automock]
#[async_trait::async_trait]
pub trait RuleGateway: Send + Sync {
    /// Check that the configured token is valid
    async fn verify_token(&self) -> Result<TokenStatus, GatewayFailure>;

    /// Look up the zone identifier for a domain
    async fn resolve_zone(&self, domain: &str) -> Result<String, GatewayFailure>;

    /// Create a forwarding rule `address -> destination`; returns the rule id
    async fn create_rule(&self, zone_id: &str, address: &str, destination: &str) -> Result<String, GatewayFailure>;

    /// All literal-address rules in the zone whose address ends in `@domain`
    async fn list_rules(&self, zone_id: &str, domain: &str) -> Result<Vec<RuleSummary>, GatewayFailure>;

    /// Delete one rule by id
    async fn delete_rule(&self, zone_id: &str, rule_id: &str) -> Result<(), GatewayFailure>;
}

/// Changes to fold into a domain's export snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotUpdate {
    /// Terminal records from this run
    pub records: Vec<AliasRecord>,
    /// Secrets to attach; latest wins per address
    pub credentials: Vec<CredentialPair>,
    /// Section appended to the compact report, if any
    pub report: Option<ReportSection>,
}

/// On-disk export snapshot for one domain
#[mockall::automock]
#[async_trait::async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Records in the structured list; empty when none exists yet
    async fn load_records(&self, domain: &str) -> AliasctlResult<Vec<AliasRecord>>;

    /// Merge an update into all three files
    async fn merge(&self, domain: &str, update: SnapshotUpdate) -> AliasctlResult<MergeSummary>;

    /// Drop addresses from the structured and flat lists, appending `report`
    async fn remove(&self, domain: &str, addresses: Vec<String>, report: Option<ReportSection>) -> AliasctlResult<usize>;

    /// Rebuild the flat list from the structured list (union with existing lines)
    async fn convert_to_flat(&self, domain: &str) -> AliasctlResult<usize>;
}
