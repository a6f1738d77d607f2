//! Test fixtures and data for aliasctl tests

use std::path::Path;
use std::time::Duration;

use aliasctl::services::RetryPolicy;
use aliasctl::{AppConfig, ConfigOverrides};
use shared::AliasRecord;

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const DOMAIN: &'static str = "example.com";
    pub const ZONE_ID: &'static str = "zone-1";
    pub const DESTINATION: &'static str = "me@inbox.net";
    pub const THEME: &'static str = "privacy-guardian";
    pub const SEED: u32 = 42;

    /// Addresses that look generated under the built-in themes
    pub const GENERATED: [&'static str; 2] = ["quiet.vault@example.com", "silent.shield@example.com"];
    /// Addresses a person would have made by hand
    pub const MANUAL: [&'static str; 2] = ["billing@example.com", "john.smith@example.com"];

    /// Fully specified config writing under `output_dir`, with no request
    /// delay and a millisecond retry backoff
    pub fn config(output_dir: &Path) -> AppConfig {
        let overrides = ConfigOverrides {
            api_token: Some("test-token".to_string()),
            zone_id: Some(Self::ZONE_ID.to_string()),
            domain: Some(Self::DOMAIN.to_string()),
            destination: Some(Self::DESTINATION.to_string()),
            seed: None,
            request_delay_ms: Some(0),
            output_dir: Some(output_dir.to_path_buf()),
        };
        let mut config = AppConfig::from_lookup(overrides, |_| None).expect("valid test config");
        config.retry = RetryPolicy::new(3, Duration::from_millis(1));
        config
    }

    /// Successful record as it would appear in an export
    pub fn exported(address: &str, rule_id: &str, password: Option<&str>) -> AliasRecord {
        let mut record = AliasRecord::pending(address, Some(Self::THEME));
        record.complete(Ok(rule_id.to_string()));
        record.password = password.map(str::to_string);
        record
    }
}
