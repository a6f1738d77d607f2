//! Service implementations
//!
//! Real implementations of the service traits plus the retry wrapper the
//! workflows put around every gateway call.

pub mod cloudflare;
pub mod export;
pub mod retry;

#[cfg(test)]
mod tests;

pub use cloudflare::RealRuleGateway;
pub use export::RealSnapshotStore;
pub use retry::{Attempted, RetryPolicy};
