//! Retail VM price lookup
//!
//! `client` talks to the retail prices HTTP API, `fetcher` walks its
//! pagination with retries and reports a `FetchOutcome`. The types here are
//! shared by both and by the estimator.

pub mod client;
pub mod fetcher;

pub use client::RetailPricesClient;
pub use fetcher::PriceFetcher;

use crate::error::{CostctlError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// SKU to hourly price, built fresh per fetch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PriceTable {
    prices: BTreeMap<String, f64>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a price, replacing any earlier one for the same SKU
    pub fn insert(&mut self, sku: impl Into<String>, hourly_price: f64) -> Option<f64> {
        self.prices.insert(sku.into(), hourly_price)
    }

    pub fn get(&self, sku: &str) -> Option<f64> {
        self.prices.get(sku).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.prices.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Keep only the given SKUs
    pub fn retain_skus(&mut self, skus: &[String]) {
        self.prices.retain(|sku, _| skus.iter().any(|s| s == sku));
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for PriceTable {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut table = PriceTable::new();
        for (sku, price) in iter {
            table.insert(sku, price);
        }
        table
    }
}

/// One item of a retail prices page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetailPriceItem {
    #[serde(rename = "armSkuName", default)]
    pub arm_sku_name: Option<String>,
    #[serde(rename = "retailPrice", default)]
    pub retail_price: Option<f64>,
    #[serde(rename = "productName", default)]
    pub product_name: Option<String>,
    #[serde(rename = "meterName", default)]
    pub meter_name: Option<String>,
    #[serde(rename = "currencyCode", default)]
    pub currency_code: Option<String>,
}

impl RetailPriceItem {
    /// SKU and price, if this item carries a usable price
    ///
    /// Requires a non-empty SKU and a finite, non-negative price.
    pub fn priced_sku(&self) -> Option<(&str, f64)> {
        let sku = self.arm_sku_name.as_deref().filter(|s| !s.is_empty())?;
        let price = self.retail_price.filter(|p| p.is_finite() && *p >= 0.0)?;
        Some((sku, price))
    }
}

/// One page of the retail prices API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricePage {
    #[serde(rename = "Items", default)]
    pub items: Vec<RetailPriceItem>,
    #[serde(rename = "NextPageLink", default)]
    pub next_page_link: Option<String>,
}

impl PricePage {
    pub fn next_link(&self) -> Option<&str> {
        self.next_page_link.as_deref().filter(|l| !l.is_empty())
    }
}

/// Which page to request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// First page: endpoint plus the region filter
    First { region: String },
    /// Follow-up page: the API's `NextPageLink`, used verbatim
    Next { url: String },
}

/// OData filter selecting hourly pay-as-you-go VM prices in a region
pub fn region_filter(region: &str) -> String {
    format!(
        "serviceName eq 'Virtual Machines' and armRegionName eq '{}' and priceType eq 'Consumption' and unitOfMeasure eq '1 Hour'",
        region
    )
}

/// Source of price pages
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<PricePage>;
}

/// Counters for one fetch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FetchStats {
    /// Pages fetched successfully
    pub pages: u32,
    /// Retries performed across all pages
    pub retries: u32,
}

/// Result of walking every price page
#[derive(Debug)]
pub enum FetchOutcome {
    /// Every page was fetched
    Complete { prices: PriceTable, stats: FetchStats },
    /// Some pages were fetched before a page exhausted its retries
    Partial {
        prices: PriceTable,
        error: CostctlError,
        stats: FetchStats,
    },
    /// The first page exhausted its retries
    Failed { error: CostctlError, stats: FetchStats },
}

impl FetchOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, FetchOutcome::Complete { .. })
    }

    pub fn prices(&self) -> Option<&PriceTable> {
        match self {
            FetchOutcome::Complete { prices, .. } | FetchOutcome::Partial { prices, .. } => {
                Some(prices)
            }
            FetchOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&CostctlError> {
        match self {
            FetchOutcome::Complete { .. } => None,
            FetchOutcome::Partial { error, .. } | FetchOutcome::Failed { error, .. } => Some(error),
        }
    }

    pub fn stats(&self) -> FetchStats {
        match self {
            FetchOutcome::Complete { stats, .. }
            | FetchOutcome::Partial { stats, .. }
            | FetchOutcome::Failed { stats, .. } => *stats,
        }
    }

    /// Whatever was accumulated, dropping the failure (possibly empty)
    pub fn into_prices(self) -> PriceTable {
        match self {
            FetchOutcome::Complete { prices, .. } | FetchOutcome::Partial { prices, .. } => prices,
            FetchOutcome::Failed { .. } => PriceTable::new(),
        }
    }
}
