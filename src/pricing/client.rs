//! HTTP client for the retail prices API

use super::{region_filter, PageRequest, PricePage, PriceSource};
use crate::config::PricingConfig;
use crate::error::{CostctlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("costctl/", env!("CARGO_PKG_VERSION"));

/// Unauthenticated client for the retail prices endpoint
pub struct RetailPricesClient {
    client: Client,
    endpoint: String,
}

impl RetailPricesClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &PricingConfig) -> Result<Self> {
        Self::new(
            config.endpoint.clone(),
            Duration::from_secs(config.request_timeout_secs.max(1)),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PriceSource for RetailPricesClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<PricePage> {
        let builder = match request {
            PageRequest::First { region } => {
                debug!("Requesting first price page for {} from {}", region, self.endpoint);
                self.client
                    .get(&self.endpoint)
                    .query(&[("$filter", region_filter(region))])
            }
            PageRequest::Next { url } => {
                debug!("Requesting next price page: {}", url);
                self.client.get(url)
            }
        };

        let response = builder
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CostctlError::Http {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let page: PricePage = response.json().await?;
        debug!(
            "Received {} price items (next page: {})",
            page.items.len(),
            page.next_link().is_some()
        );
        Ok(page)
    }
}
