//! Test helpers and builder patterns for manager tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::TempDir;

use aliasctl::services::RealSnapshotStore;
use aliasctl::{AliasManager, AppConfig, CreateRequest, MockRuleGateway, MockSnapshotStore};
use shared::{GatewayFailure, RuleSummary};

use super::fixtures::TestFixtures;

/// Manager over a mocked gateway and a real store in a temp directory
pub type FileManager = AliasManager<MockRuleGateway, RealSnapshotStore>;

/// Manager over mocks only
pub type MockManager = AliasManager<MockRuleGateway, MockSnapshotStore>;

/// Builder for managers with a mocked gateway
pub struct ManagerBuilder {
    config: AppConfig,
    gateway: MockRuleGateway,
    temp: TempDir,
}

impl ManagerBuilder {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("temp dir");
        Self {
            config: TestFixtures::config(temp.path()),
            gateway: MockRuleGateway::new(),
            temp,
        }
    }

    /// Adjust the config before the manager is built
    pub fn with_config<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        setup(&mut self.config);
        self
    }

    /// Configure the gateway mock with a setup function
    pub fn with_gateway<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockRuleGateway),
    {
        setup(&mut self.gateway);
        self
    }

    /// Build with a real store; the temp dir must outlive the manager
    pub fn build(self) -> (FileManager, RealSnapshotStore, TempDir) {
        let store = RealSnapshotStore::with_base_dir(self.temp.path());
        let inspect = RealSnapshotStore::with_base_dir(self.temp.path());
        (AliasManager::new(self.config, self.gateway, store), inspect, self.temp)
    }

    /// Build with a mocked store
    pub fn build_with_store(self, store: MockSnapshotStore) -> MockManager {
        AliasManager::new(self.config, self.gateway, store)
    }
}

impl Default for ManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper functions for common test operations
pub struct TestHelpers;

impl TestHelpers {
    pub fn request(count: usize) -> CreateRequest {
        CreateRequest {
            theme: TestFixtures::THEME.to_string(),
            count,
            seed: Some(TestFixtures::SEED),
            dry_run: false,
            password_length: Some(12),
        }
    }

    /// Gateway whose n-th create call (0-based) fails once with `failure`;
    /// every other call succeeds with `rule-<n>`. Returns the call counter.
    pub fn create_failing_at(
        gateway: &mut MockRuleGateway,
        failing_call: usize,
        failure: GatewayFailure,
    ) -> Arc<AtomicUsize> {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        gateway
            .expect_create_rule()
            .withf(|zone, _, destination| zone == TestFixtures::ZONE_ID && destination == TestFixtures::DESTINATION)
            .returning(move |_, _, _| {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n == failing_call {
                    Err(failure.clone())
                } else {
                    Ok(format!("rule-{n}"))
                }
            });
        calls
    }

    /// Gateway listing `addresses` as rules `r0`, `r1`, ...
    pub fn listing(gateway: &mut MockRuleGateway, addresses: &[&str]) {
        let rules: Vec<RuleSummary> = addresses
            .iter()
            .enumerate()
            .map(|(i, address)| RuleSummary {
                rule_id: format!("r{i}"),
                address: address.to_string(),
                enabled: true,
            })
            .collect();
        gateway.expect_list_rules().returning(move |_, _| Ok(rules.clone()));
    }
}
