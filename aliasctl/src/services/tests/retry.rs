use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use shared::GatewayFailure;

use super::common::{TEST_BASE_DELAY, fast_policy};
use crate::services::retry::RetryPolicy;

/// Call that fails with each queued failure in turn, then succeeds
fn scripted(failures: Vec<GatewayFailure>) -> (Arc<AtomicU32>, impl FnMut() -> std::future::Ready<Result<&'static str, GatewayFailure>>) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let call = move || {
        let n = counter.fetch_add(1, Ordering::SeqCst) as usize;
        std::future::ready(match failures.get(n) {
            Some(failure) => Err(failure.clone()),
            None => Ok("rule-id"),
        })
    };
    (calls, call)
}

#[tokio::test]
async fn test_success_first_try() {
    let (calls, call) = scripted(vec![]);
    let outcome = fast_policy().execute("create", call).await;
    assert_eq!(outcome.result, Ok("rule-id"));
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.retries(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_transient_then_success() {
    let (calls, call) = scripted(vec![GatewayFailure::RateLimited("slow down".into())]);
    let outcome = fast_policy().execute("create", call).await;
    assert_eq!(outcome.result, Ok("rule-id"));
    assert_eq!(outcome.retries(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_exhaustion_surfaces_last_error() {
    let (calls, call) = scripted(vec![
        GatewayFailure::ServerError {
            status: 502,
            message: "first".into(),
        },
        GatewayFailure::Network("second".into()),
        GatewayFailure::RateLimited("third".into()),
        GatewayFailure::RateLimited("never reached".into()),
    ]);
    let outcome = fast_policy().execute("create", call).await;
    assert_eq!(outcome.result, Err(GatewayFailure::RateLimited("third".into())));
    assert_eq!(outcome.attempts, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_fatal_is_not_retried() {
    let (calls, call) = scripted(vec![GatewayFailure::Unauthorized("bad token".into())]);
    let outcome = fast_policy().execute("delete", call).await;
    assert!(matches!(outcome.result, Err(GatewayFailure::Unauthorized(_))));
    assert_eq!(outcome.attempts, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_doubles() {
    let policy = RetryPolicy::new(3, Duration::from_millis(1000));
    let (_, call) = scripted(vec![
        GatewayFailure::RateLimited("a".into()),
        GatewayFailure::RateLimited("b".into()),
    ]);
    let started = tokio::time::Instant::now();
    let outcome = policy.execute("create", call).await;
    assert!(outcome.result.is_ok());
    // 1s then 2s
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(3000));
    assert!(elapsed < Duration::from_millis(3100));
}

#[test]
fn test_delay_schedule() {
    let policy = RetryPolicy::new(5, TEST_BASE_DELAY);
    assert_eq!(policy.delay_for(1), TEST_BASE_DELAY);
    assert_eq!(policy.delay_for(2), TEST_BASE_DELAY * 2);
    assert_eq!(policy.delay_for(3), TEST_BASE_DELAY * 4);
    assert_eq!(RetryPolicy::new(0, TEST_BASE_DELAY).max_attempts, 1);
}
