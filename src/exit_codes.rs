//! Exit code standardization for costctl
//!
//! ## Exit Code Convention
//!
//! - `0` = Success
//! - `1` = User error (invalid input, unpriced SKU under the `fail` policy)
//! - `2` = System error (pricing API failure, pricing unavailable, I/O)
//! - `3` = Configuration error (invalid tolerance, bad catalog, config parse error)

use crate::error::CostctlError;

/// Standard exit codes for costctl
pub mod codes {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// User error (invalid input, validation failure)
    pub const USER_ERROR: i32 = 1;
    /// System error (pricing API failure, network error)
    pub const SYSTEM_ERROR: i32 = 2;
    /// Configuration error (invalid tolerance, catalog or config file)
    pub const CONFIG_ERROR: i32 = 3;
}

/// Map a CostctlError to an appropriate exit code
pub fn exit_code_for_error(error: &CostctlError) -> i32 {
    use CostctlError::*;
    match error {
        Config(_) => codes::CONFIG_ERROR,

        Validation { .. } => codes::USER_ERROR,
        UnpricedSku { .. } => codes::USER_ERROR,

        Http { .. } => codes::SYSTEM_ERROR,
        Transport { .. } => codes::SYSTEM_ERROR,
        Decode(_) => codes::SYSTEM_ERROR,
        PricingUnavailable { .. } => codes::SYSTEM_ERROR,
        Retryable { .. } => codes::SYSTEM_ERROR,
        Io(_) => codes::SYSTEM_ERROR,
        Json(_) => codes::SYSTEM_ERROR,
    }
}

/// Exit code for an error that reached `main`
///
/// Library errors keep their category; anything else (argument plumbing,
/// anyhow context) is treated as a system error.
pub fn exit_code_for_anyhow(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<CostctlError>() {
        Some(e) => exit_code_for_error(e),
        None => codes::SYSTEM_ERROR,
    }
}
