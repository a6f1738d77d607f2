//! Email alias management for Cloudflare Email Routing
//!
//! Generates themed alias batches, creates forwarding rules for them through
//! an injected [`RuleGateway`], and keeps a per-domain export snapshot in
//! three formats through an injected [`SnapshotStore`].

pub mod commands;
pub mod config;
pub mod error;
pub mod manager;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use config::{AppConfig, ConfigOverrides};
pub use error::{AliasctlError, AliasctlResult};
pub use manager::{AliasManager, CreateRequest, DeleteSource};
pub use traits::{MockRuleGateway, MockSnapshotStore, RuleGateway, SnapshotStore, SnapshotUpdate, TokenStatus};
