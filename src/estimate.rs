//! Monthly cost estimation
//!
//! Combines the recommender and the price fetcher: every recommended role
//! costs `hourly price * hours in month * server count`, and the report total
//! is the sum over priced roles.

use crate::catalog::{Catalog, PayerSize, PriceTolerance, WorkloadType};
use crate::config::{EstimateConfig, MissingSkuPolicy, DEFAULT_HOURS_IN_MONTH, DEFAULT_REGION};
use crate::error::{CostctlError, Result};
use crate::pricing::{FetchOutcome, PriceFetcher, PriceSource, PriceTable};
use crate::recommend::recommend;
use crate::retry::RetryPolicy;
use crate::validation::{validate_hours_in_month, validate_region};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// What to estimate
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateRequest {
    pub subscriber_count: u64,
    pub tolerance: PriceTolerance,
    pub region: String,
    pub hours_in_month: f64,
}

impl EstimateRequest {
    pub fn new(subscriber_count: u64, tolerance: PriceTolerance) -> Self {
        Self {
            subscriber_count,
            tolerance,
            region: DEFAULT_REGION.to_string(),
            hours_in_month: DEFAULT_HOURS_IN_MONTH,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_hours(mut self, hours_in_month: f64) -> Self {
        self.hours_in_month = hours_in_month;
        self
    }
}

/// Estimator policy knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimateOptions {
    pub missing_sku: MissingSkuPolicy,
    pub allow_partial_prices: bool,
}

impl Default for EstimateOptions {
    fn default() -> Self {
        Self {
            missing_sku: MissingSkuPolicy::Skip,
            allow_partial_prices: true,
        }
    }
}

impl From<&EstimateConfig> for EstimateOptions {
    fn from(config: &EstimateConfig) -> Self {
        Self {
            missing_sku: config.missing_sku,
            allow_partial_prices: config.allow_partial_prices,
        }
    }
}

/// Cost of one priced role
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostLine {
    pub role: String,
    pub vm_sku: String,
    pub workload_type: WorkloadType,
    pub server_count: u32,
    pub hourly_price: f64,
    pub monthly_cost: f64,
}

/// A recommended role whose SKU had no price
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnpricedRole {
    pub role: String,
    pub vm_sku: String,
    pub server_count: u32,
}

/// Structured estimate result
#[derive(Debug, Clone, Serialize)]
pub struct CostReport {
    pub subscriber_count: u64,
    pub tolerance: PriceTolerance,
    pub payer_size: PayerSize,
    pub region: String,
    pub hours_in_month: f64,
    pub lines: Vec<CostLine>,
    pub unpriced: Vec<UnpricedRole>,
    pub total_monthly_cost: f64,
    /// False when the estimate used a partially fetched price table
    pub pricing_complete: bool,
    pub generated_at: DateTime<Utc>,
}

impl CostReport {
    pub fn line(&self, role: &str) -> Option<&CostLine> {
        self.lines.iter().find(|l| l.role == role)
    }

    pub fn is_fully_priced(&self) -> bool {
        self.unpriced.is_empty()
    }
}

/// Estimate against an already fetched price table
///
/// An empty table is `PricingUnavailable`, never a zero total.
pub fn estimate_with_prices(
    catalog: &Catalog,
    prices: &PriceTable,
    request: &EstimateRequest,
    options: EstimateOptions,
) -> Result<CostReport> {
    validate_hours_in_month(request.hours_in_month)?;

    if prices.is_empty() {
        return Err(CostctlError::PricingUnavailable {
            region: request.region.clone(),
            reason: "price table is empty".to_string(),
        });
    }

    let recommendations = recommend(catalog, request.subscriber_count, request.tolerance)?;

    let mut lines = Vec::new();
    let mut unpriced = Vec::new();
    for (role, rec) in recommendations {
        match prices.get(&rec.vm_sku) {
            Some(hourly_price) => {
                let monthly_cost = hourly_price * request.hours_in_month * rec.server_count as f64;
                lines.push(CostLine {
                    role,
                    vm_sku: rec.vm_sku,
                    workload_type: rec.workload_type,
                    server_count: rec.server_count,
                    hourly_price,
                    monthly_cost,
                });
            }
            None => match options.missing_sku {
                MissingSkuPolicy::Fail => {
                    return Err(CostctlError::UnpricedSku {
                        role,
                        sku: rec.vm_sku,
                    });
                }
                MissingSkuPolicy::Skip => {
                    warn!("No price for {} ({}), counting it as zero", role, rec.vm_sku);
                    unpriced.push(UnpricedRole {
                        role,
                        vm_sku: rec.vm_sku,
                        server_count: rec.server_count,
                    });
                }
            },
        }
    }

    let total_monthly_cost = lines.iter().map(|l| l.monthly_cost).sum();

    Ok(CostReport {
        subscriber_count: request.subscriber_count,
        tolerance: request.tolerance,
        payer_size: PayerSize::classify(request.subscriber_count),
        region: request.region.clone(),
        hours_in_month: request.hours_in_month,
        lines,
        unpriced,
        total_monthly_cost,
        pricing_complete: true,
        generated_at: Utc::now(),
    })
}

/// Fetches prices and estimates in one call
pub struct Estimator<'a, S, P> {
    catalog: &'a Catalog,
    fetcher: &'a PriceFetcher<S, P>,
    options: EstimateOptions,
}

impl<'a, S: PriceSource, P: RetryPolicy> Estimator<'a, S, P> {
    pub fn new(catalog: &'a Catalog, fetcher: &'a PriceFetcher<S, P>, options: EstimateOptions) -> Self {
        Self {
            catalog,
            fetcher,
            options,
        }
    }

    pub async fn estimate(&self, request: &EstimateRequest) -> Result<CostReport> {
        validate_region(&request.region)?;
        validate_hours_in_month(request.hours_in_month)?;

        let outcome = self.fetcher.fetch_prices(&request.region).await;
        let (prices, complete) = self.accept_prices(&request.region, outcome)?;

        let mut report = estimate_with_prices(self.catalog, &prices, request, self.options)?;
        report.pricing_complete = complete;

        info!(
            "Estimated {:.2}/month for {} subscribers ({}) in {}",
            report.total_monthly_cost, request.subscriber_count, request.tolerance, request.region
        );
        Ok(report)
    }

    /// Total monthly cost only
    pub async fn estimate_monthly_cost(&self, request: &EstimateRequest) -> Result<f64> {
        Ok(self.estimate(request).await?.total_monthly_cost)
    }

    fn accept_prices(&self, region: &str, outcome: FetchOutcome) -> Result<(PriceTable, bool)> {
        match outcome {
            FetchOutcome::Complete { prices, .. } => Ok((prices, true)),
            FetchOutcome::Partial { prices, error, .. } if self.options.allow_partial_prices => {
                warn!(
                    "Using partial price table ({} SKUs) for {}: {}",
                    prices.len(),
                    region,
                    error
                );
                Ok((prices, false))
            }
            FetchOutcome::Partial { error, .. } => Err(CostctlError::PricingUnavailable {
                region: region.to_string(),
                reason: format!("price fetch incomplete: {}", error),
            }),
            FetchOutcome::Failed { error, .. } => Err(CostctlError::PricingUnavailable {
                region: region.to_string(),
                reason: error.to_string(),
            }),
        }
    }
}
