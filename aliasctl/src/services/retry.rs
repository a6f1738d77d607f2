//! Bounded exponential backoff around a single gateway call

use std::future::Future;
use std::time::Duration;

use shared::GatewayFailure;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Retry settings; `max_attempts` counts the first call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

/// Result of a wrapped call plus how many calls it took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempted<T> {
    pub result: Result<T, GatewayFailure>,
    pub attempts: u32,
}

impl<T> Attempted<T> {
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay before retry number `attempt` (1-based): base, 2x base, 4x base...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `call` until it succeeds, fails fatally, or attempts run out.
    ///
    /// Transient failures sleep `delay_for(n)` between attempts; the last
    /// transient failure is returned once the budget is spent.
    pub async fn execute<T, F, Fut>(&self, label: &str, mut call: F) -> Attempted<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayFailure>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match call().await {
                Ok(value) => {
                    return Attempted {
                        result: Ok(value),
                        attempts: attempt,
                    };
                }
                Err(failure) if failure.is_transient() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        "⏳ {} attempt {}/{} failed ({}); retrying in {:?}",
                        label,
                        attempt,
                        self.max_attempts,
                        failure,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(failure) => {
                    if failure.is_transient() {
                        tracing::warn!("{} gave up after {} attempts: {}", label, attempt, failure);
                    }
                    return Attempted {
                        result: Err(failure),
                        attempts: attempt,
                    };
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}
