//! Shared logging utilities for consistent tracing across the workspace

use crate::types::BatchId;
use chrono::{DateTime, Utc};
use tracing::{error, info};

/// Crates whose events are shown at the requested level
const WORKSPACE_TARGETS: &[&str] = &["aliasctl", "generator", "shared"];

/// Build the filter directive for a base level, e.g. `aliasctl=info,...,reqwest=warn`
pub fn filter_directive(log_level: Option<&str>) -> String {
    let base_level = log_level.unwrap_or("info");
    let mut directives: Vec<String> = WORKSPACE_TARGETS
        .iter()
        .map(|target| format!("{target}={base_level}"))
        .collect();
    directives.push("reqwest=warn".to_string());
    directives.push("hyper=warn".to_string());
    directives.join(",")
}

/// Initialize the stderr tracing subscriber.
///
/// `RUST_LOG` wins over `log_level` when it is set.
pub fn init_tracing(log_level: Option<&str>) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(log_level)));

    // try_init so tests and repeated calls do not panic
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init();
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for batch-aware info logging
#[macro_export]
macro_rules! batch_info {
    ($batch_id:expr, $($arg:tt)*) => {
        tracing::info!(
            batch = %$batch_id.short(),
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for batch-aware warning logging
#[macro_export]
macro_rules! batch_warn {
    ($batch_id:expr, $($arg:tt)*) => {
        tracing::warn!(
            batch = %$batch_id.short(),
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for batch-aware debug logging
#[macro_export]
macro_rules! batch_debug {
    ($batch_id:expr, $($arg:tt)*) => {
        tracing::debug!(
            batch = %$batch_id.short(),
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Contextual logging helper for startup messages
pub fn log_startup(batch_id: &BatchId, details: &str) {
    info!(
        batch = %batch_id.short(),
        timestamp = format_timestamp(),
        "🚀 Starting {}",
        details
    );
}

/// Contextual logging helper for error conditions
pub fn log_error(batch_id: &BatchId, context: &str, error: &dyn std::fmt::Display) {
    error!(
        batch = %batch_id.short(),
        timestamp = format_timestamp(),
        error = %error,
        "❌ {} failed: {}",
        context,
        error
    );
}

/// Contextual logging helper for success conditions
pub fn log_success(batch_id: &BatchId, message: &str) {
    info!(
        batch = %batch_id.short(),
        timestamp = format_timestamp(),
        "✅ {}",
        message
    );
}

/// Contextual logging helper for progress updates
pub fn log_progress(batch_id: &BatchId, action: &str, details: &str) {
    info!(
        batch = %batch_id.short(),
        timestamp = format_timestamp(),
        "📋 {}: {}",
        action,
        details
    );
}
