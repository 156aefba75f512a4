//! costctl library
//!
//! Estimates the monthly VM cost of a fixed set of server roles. The
//! catalog maps a subscriber count and price tolerance to a VM SKU per role,
//! the pricing module fetches hourly retail prices, and the estimator
//! multiplies them out into a `CostReport`.

pub mod catalog;
pub mod config;
pub mod error;
pub mod estimate;
pub mod exit_codes;
pub mod pricing;
pub mod recommend;
pub mod report;
pub mod retry;
pub mod validation;

// Re-export commonly used types
pub use catalog::{Catalog, PayerSize, PriceTolerance, ServerRoleSpec, SizeThresholds, WorkloadType};
pub use error::{ConfigError, CostctlError, Result};
pub use estimate::{estimate_with_prices, CostReport, EstimateOptions, EstimateRequest, Estimator};
pub use pricing::{FetchOutcome, PriceFetcher, PriceTable};
pub use recommend::{recommend, Recommendation, Recommendations};
