//! Service-specific tests
//!
//! Each service has its own test file with dedicated fixtures and helpers.

mod retry;

// Common test utilities for services
pub mod common {
    use std::time::Duration;

    use crate::config::{AppConfig, ConfigOverrides};
    use crate::services::retry::RetryPolicy;

    /// Backoff short enough to keep retry tests fast
    pub const TEST_BASE_DELAY: Duration = Duration::from_millis(5);

    pub fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(3, TEST_BASE_DELAY)
    }

    /// Config pointed at a mock server
    pub fn config_for(api_base: &str) -> AppConfig {
        let overrides = ConfigOverrides {
            api_token: Some("test-token".to_string()),
            domain: Some("example.com".to_string()),
            ..Default::default()
        };
        let base = api_base.to_string();
        AppConfig::from_lookup(overrides, move |key| {
            (key == crate::config::ENV_API_BASE).then(|| base.clone())
        })
        .expect("valid test config")
    }
}
