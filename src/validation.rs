//! Input validation utilities
//!
//! Provides validation functions for user inputs so that bad values are
//! rejected before any request reaches the pricing API.

use crate::config::MAX_HOURS_IN_MONTH;
use crate::error::{CostctlError, Result};
use regex::Regex;
use std::sync::OnceLock;

fn region_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[a-z][a-z0-9]{1,39}$").ok())
        .as_ref()
}

/// Validate an ARM region code (e.g. `eastus`, `westeurope`, `southcentralus2`)
///
/// The region is interpolated into an OData filter, so quotes and spaces are
/// rejected along with anything else outside lowercase alphanumerics.
pub fn validate_region(region: &str) -> Result<()> {
    if region.is_empty() {
        return Err(CostctlError::Validation {
            field: "region".to_string(),
            reason: "Region must not be empty".to_string(),
        });
    }

    if !region_pattern().is_some_and(|re| re.is_match(region)) {
        return Err(CostctlError::Validation {
            field: "region".to_string(),
            reason: format!(
                "Region must be a lowercase ARM region code like 'eastus', got: {}",
                region
            ),
        });
    }

    Ok(())
}

/// Validate the number of billable hours in a month
pub fn validate_hours_in_month(hours: f64) -> Result<()> {
    if !hours.is_finite() || hours <= 0.0 {
        return Err(CostctlError::Validation {
            field: "hours_in_month".to_string(),
            reason: format!("Hours in month must be a positive number, got: {}", hours),
        });
    }
    if hours > MAX_HOURS_IN_MONTH {
        return Err(CostctlError::Validation {
            field: "hours_in_month".to_string(),
            reason: format!("A month has at most {} hours, got: {}", MAX_HOURS_IN_MONTH, hours),
        });
    }
    Ok(())
}
