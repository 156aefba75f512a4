//! Tests for retry logic
//!
//! Tests verify exponential backoff, retry policies, and error handling.

use costctl::error::{ConfigError, CostctlError, IsRetryable};
use costctl::retry::{ExponentialBackoffPolicy, NoRetryPolicy, RetryPolicy};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

fn transient() -> CostctlError {
    CostctlError::Transport {
        message: "transient error".to_string(),
        source: None,
    }
}

fn fast(max_attempts: u32) -> ExponentialBackoffPolicy {
    ExponentialBackoffPolicy::new(max_attempts).with_base_delay(Duration::from_millis(1))
}

#[test]
fn test_default_policy_has_three_attempts() {
    let policy = ExponentialBackoffPolicy::default();
    assert_eq!(policy.max_attempts(), 3);
    assert_eq!(policy.nominal_delay(1), Duration::from_secs(2));
    assert_eq!(policy.nominal_delay(2), Duration::from_secs(4));
}

#[tokio::test]
async fn test_retry_succeeds_immediately() {
    let policy = fast(3);
    let call_count = AtomicU32::new(0);

    let result = policy
        .execute_with_retry(|| async {
            call_count.fetch_add(1, Ordering::SeqCst);
            Ok::<String, CostctlError>("success".to_string())
        })
        .await;

    assert_eq!(result.unwrap(), "success");
    assert_eq!(call_count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_retry_succeeds_after_failures() {
    let policy = fast(3);
    let call_count = AtomicU32::new(0);

    let result = policy
        .execute_with_retry(|| async {
            let count = call_count.fetch_add(1, Ordering::SeqCst);
            if count < 2 {
                Err(transient())
            } else {
                Ok::<String, CostctlError>("success".to_string())
            }
        })
        .await;

    assert_eq!(result.unwrap(), "success");
    assert_eq!(call_count.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retry_exhausts_attempts() {
    let policy = fast(3);
    let call_count = AtomicU32::new(0);

    let result = policy
        .execute_with_retry(|| async {
            call_count.fetch_add(1, Ordering::SeqCst);
            Err::<String, CostctlError>(transient())
        })
        .await;

    assert!(matches!(
        result,
        Err(CostctlError::Retryable {
            attempt: 3,
            max_attempts: 3,
            ..
        })
    ));
    assert_eq!(call_count.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retry_non_retryable_error() {
    let policy = fast(3);
    let call_count = AtomicU32::new(0);

    let result = policy
        .execute_with_retry(|| async {
            call_count.fetch_add(1, Ordering::SeqCst);
            Err::<String, CostctlError>(CostctlError::Validation {
                field: "region".to_string(),
                reason: "invalid".to_string(),
            })
        })
        .await;

    assert!(matches!(result, Err(CostctlError::Validation { .. })));
    assert_eq!(call_count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_no_retry_policy_behavior() {
    let policy = NoRetryPolicy;
    let call_count = AtomicU32::new(0);

    let result = policy
        .execute_with_retry(|| async {
            call_count.fetch_add(1, Ordering::SeqCst);
            Err::<String, CostctlError>(transient())
        })
        .await;

    assert!(result.is_err());
    assert_eq!(call_count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_retry_backoff_timing() {
    let policy = ExponentialBackoffPolicy::new(3).with_base_delay(Duration::from_millis(20));
    let call_count = AtomicU32::new(0);
    let start = Instant::now();

    let result = policy
        .execute_with_retry(|| async {
            let count = call_count.fetch_add(1, Ordering::SeqCst);
            if count < 2 {
                Err(transient())
            } else {
                Ok::<u32, CostctlError>(count)
            }
        })
        .await;

    assert_eq!(result.unwrap(), 2);
    // 20ms * 2 + 20ms * 4
    assert!(start.elapsed() >= Duration::from_millis(120));
}

#[test]
fn test_is_retryable_trait() {
    assert!(transient().is_retryable());
    assert!(CostctlError::Http {
        status: 429,
        url: "https://prices.example".to_string()
    }
    .is_retryable());
    assert!(CostctlError::Io(std::io::Error::new(std::io::ErrorKind::Other, "test")).is_retryable());

    assert!(!CostctlError::Validation {
        field: "test".to_string(),
        reason: "invalid".to_string(),
    }
    .is_retryable());
    assert!(!CostctlError::Config(ConfigError::InvalidTolerance("premium".to_string())).is_retryable());
}
