//! Error types for costctl
//!
//! This module defines the error handling strategy for costctl. There are two
//! error types: `CostctlError` (main error enum) and `ConfigError` (configuration-specific).
//!
//! ## Error Handling Philosophy
//!
//! Library code uses `crate::error::Result<T>` which returns `CostctlError`.
//! The binary uses `anyhow::Result<T>` for top-level error handling and maps
//! library errors to exit codes via `crate::exit_codes`.
//!
//! ## Retry Awareness
//!
//! Errors implement `IsRetryable` to indicate whether a price page fetch should
//! be retried. The `RetryPolicy` in `src/retry.rs` uses this to determine retry
//! behavior. Only `Http`, `Transport`, `Decode`, `Io` and `Retryable` are retryable.
//!
//! ## When to Use Which Error
//!
//! - `ConfigError`: catalog, tolerance and config file problems
//!   - Automatically converted to `CostctlError::Config` via `#[from]`
//!
//! - `Http`/`Transport`/`Decode`: a single pricing API request failed
//!   - Retryable; surfaced inside `FetchOutcome` once attempts run out
//!
//! - `PricingUnavailable`: the estimator has no usable price table
//!   - Not retryable; replaces the misleading zero total
//!
//! - `UnpricedSku`: a recommended SKU has no price and the policy is `fail`
//!
//! - `Validation`: user input (region, subscriber count, hours)

use thiserror::Error;

/// Main error type for costctl
#[derive(Error, Debug)]
pub enum CostctlError {
    #[error("Configuration error")]
    Config(#[from] ConfigError),

    #[error("Pricing API returned HTTP {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Pricing API request failed: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to decode pricing response: {0}")]
    Decode(String),

    #[error("Pricing unavailable for region {region}: {reason}")]
    PricingUnavailable { region: String, reason: String },

    #[error("No price found for {role} ({sku})")]
    UnpricedSku { role: String, sku: String },

    #[error("Retryable error (attempt {attempt}/{max_attempts}): {reason}")]
    Retryable {
        attempt: u32,
        max_attempts: u32,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid price tolerance: {0} (expected cost-optimized, balanced or performance-first)")]
    InvalidTolerance(String),

    #[error("Role {role} does not define the {tolerance} tier")]
    MissingTier { role: String, tolerance: String },

    #[error("Duplicate role in catalog: {0}")]
    DuplicateRole(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CostctlError>;

/// Trait for determining if an error is retryable
///
/// Used by `RetryPolicy` implementations to determine whether an error
/// should trigger a retry attempt.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for CostctlError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            CostctlError::Http { .. }
                | CostctlError::Transport { .. }
                | CostctlError::Decode(_)
                | CostctlError::Retryable { .. }
                | CostctlError::Io(_)
        )
    }
}

impl From<reqwest::Error> for CostctlError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return CostctlError::Decode(err.to_string());
        }
        if let Some(status) = err.status() {
            return CostctlError::Http {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            };
        }
        CostctlError::Transport {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
