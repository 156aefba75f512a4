//! Retry logic with exponential backoff
//!
//! Provides retry policies for handling transient failures
//! when fetching pricing pages.

use crate::config::PricingConfig;
use crate::error::{CostctlError, IsRetryable, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Retry policy trait
#[allow(async_fn_in_trait)]
pub trait RetryPolicy: Send + Sync {
    /// Execute a function with retry logic
    async fn execute_with_retry<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T>> + Send;
}

/// Exponential backoff retry policy
///
/// The delay before retry `n` (n starting at 1) is `base_delay * 2^n`,
/// capped at `max_delay`, plus up to `jitter_factor` of random jitter.
#[derive(Debug, Clone)]
pub struct ExponentialBackoffPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter_factor: f64,
}

impl ExponentialBackoffPolicy {
    /// Create a new policy with a one second base delay and no jitter
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_secs(1),
            max_delay: DEFAULT_MAX_DELAY,
            jitter_factor: 0.0,
        }
    }

    pub fn from_config(config: &PricingConfig) -> Self {
        Self::new(config.max_attempts)
            .with_base_delay(
                Duration::try_from_secs_f64(config.base_delay_secs.max(0.0))
                    .unwrap_or(DEFAULT_MAX_DELAY),
            )
            .with_jitter(config.jitter_factor)
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_jitter(mut self, jitter_factor: f64) -> Self {
        self.jitter_factor = jitter_factor.clamp(0.0, 1.0);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Nominal delay before retry number `retry` (1-based), without jitter
    pub fn nominal_delay(&self, retry: u32) -> Duration {
        let factor = 2f64.powi(retry.min(30) as i32);
        let delay = self.base_delay.as_secs_f64() * factor;
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }

    fn calculate_backoff(&self, retry: u32) -> Duration {
        let nominal = self.nominal_delay(retry);
        if self.jitter_factor == 0.0 {
            return nominal;
        }
        let jitter = nominal.as_secs_f64() * self.jitter_factor * fastrand::f64();
        nominal + Duration::from_secs_f64(jitter)
    }
}

impl Default for ExponentialBackoffPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

impl RetryPolicy for ExponentialBackoffPolicy {
    async fn execute_with_retry<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T>> + Send,
    {
        let mut attempt = 1;
        loop {
            let err = match f().await {
                Ok(result) => {
                    if attempt > 1 {
                        info!("Operation succeeded after {} retries", attempt - 1);
                    }
                    return Ok(result);
                }
                Err(e) => e,
            };

            if !err.is_retryable() {
                warn!("Non-retryable error, aborting: {}", err);
                return Err(err);
            }

            if attempt >= self.max_attempts {
                warn!("Max attempts ({}) reached: {}", self.max_attempts, err);
                return Err(CostctlError::Retryable {
                    attempt,
                    max_attempts: self.max_attempts,
                    reason: err.to_string(),
                    source: Some(Box::new(err)),
                });
            }

            let backoff = self.calculate_backoff(attempt);
            warn!(
                "Retryable error (attempt {}/{}), retrying in {:?}: {}",
                attempt, self.max_attempts, backoff, err
            );
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }
}

/// No retry policy (single attempt)
pub struct NoRetryPolicy;

impl RetryPolicy for NoRetryPolicy {
    async fn execute_with_retry<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T>> + Send,
    {
        f().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nominal_delay_doubles_from_two_units() {
        let policy = ExponentialBackoffPolicy::new(3);
        assert_eq!(policy.nominal_delay(1), Duration::from_secs(2));
        assert_eq!(policy.nominal_delay(2), Duration::from_secs(4));
        assert_eq!(policy.nominal_delay(3), Duration::from_secs(8));
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = ExponentialBackoffPolicy::new(10).with_max_delay(Duration::from_secs(5));
        assert_eq!(policy.nominal_delay(9), Duration::from_secs(5));
    }

    #[test]
    fn test_jitter_stays_within_factor() {
        let policy = ExponentialBackoffPolicy::new(3)
            .with_base_delay(Duration::from_millis(100))
            .with_jitter(0.5);
        for _ in 0..50 {
            let d = policy.calculate_backoff(1);
            assert!(d >= Duration::from_millis(200));
            assert!(d <= Duration::from_millis(300));
        }
    }

    #[test]
    fn test_huge_configured_base_delay_is_capped() {
        let config = PricingConfig {
            base_delay_secs: 1e30,
            ..Default::default()
        };
        let policy = ExponentialBackoffPolicy::from_config(&config);
        assert_eq!(policy.nominal_delay(1), DEFAULT_MAX_DELAY);
    }

    #[test]
    fn test_zero_attempts_means_one() {
        assert_eq!(ExponentialBackoffPolicy::new(0).max_attempts(), 1);
    }
}
