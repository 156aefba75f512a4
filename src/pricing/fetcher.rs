//! Paginated price fetch with per-page retry

use super::{FetchOutcome, FetchStats, PageRequest, PriceSource, PriceTable, RetailPricesClient};
use crate::config::PricingConfig;
use crate::error::Result;
use crate::retry::{ExponentialBackoffPolicy, RetryPolicy};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, info, warn};

/// Walks every page of a `PriceSource`, retrying each page under `policy`
pub struct PriceFetcher<S, P = ExponentialBackoffPolicy> {
    source: S,
    policy: P,
}

impl PriceFetcher<RetailPricesClient> {
    pub fn from_config(config: &PricingConfig) -> Result<Self> {
        Ok(Self::new(
            RetailPricesClient::from_config(config)?,
            ExponentialBackoffPolicy::from_config(config),
        ))
    }
}

impl<S: PriceSource, P: RetryPolicy> PriceFetcher<S, P> {
    pub fn new(source: S, policy: P) -> Self {
        Self { source, policy }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch every hourly VM price for `region`
    ///
    /// The first request carries the region filter; each following request
    /// uses the previous page's `NextPageLink` as is. A page that exhausts
    /// its retries ends the walk: the outcome is `Failed` if nothing was
    /// fetched yet and `Partial` otherwise.
    pub async fn fetch_prices(&self, region: &str) -> FetchOutcome {
        let mut prices = PriceTable::new();
        let mut stats = FetchStats::default();
        let mut visited = HashSet::new();
        let mut request = PageRequest::First {
            region: region.to_string(),
        };

        info!("Fetching VM prices for region {}", region);

        loop {
            let calls = AtomicU32::new(0);
            let result = self
                .policy
                .execute_with_retry(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    self.source.fetch_page(&request).await
                })
                .await;
            stats.retries += calls.load(Ordering::SeqCst).saturating_sub(1);

            let page = match result {
                Ok(page) => page,
                Err(error) => {
                    warn!(
                        "Giving up on price page {} for {}: {}",
                        stats.pages + 1,
                        region,
                        error
                    );
                    return if stats.pages == 0 {
                        FetchOutcome::Failed { error, stats }
                    } else {
                        FetchOutcome::Partial {
                            prices,
                            error,
                            stats,
                        }
                    };
                }
            };

            stats.pages += 1;
            let mut accepted = 0;
            for (sku, price) in page.items.iter().filter_map(|item| item.priced_sku()) {
                prices.insert(sku, price);
                accepted += 1;
            }
            debug!(
                "Page {}: {} of {} items priced",
                stats.pages,
                accepted,
                page.items.len()
            );

            match page.next_link() {
                Some(link) => {
                    if !visited.insert(link.to_string()) {
                        warn!("Pricing API repeated page link {}, stopping", link);
                        break;
                    }
                    request = PageRequest::Next {
                        url: link.to_string(),
                    };
                }
                None => break,
            }
        }

        info!(
            "Fetched {} prices from {} pages ({} retries)",
            prices.len(),
            stats.pages,
            stats.retries
        );
        FetchOutcome::Complete { prices, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CostctlError;
    use crate::pricing::{MockPriceSource, PricePage, RetailPriceItem};
    use std::time::Duration;

    fn item(sku: &str, price: f64) -> RetailPriceItem {
        RetailPriceItem {
            arm_sku_name: Some(sku.to_string()),
            retail_price: Some(price),
            ..Default::default()
        }
    }

    fn page(items: Vec<RetailPriceItem>, next: Option<&str>) -> PricePage {
        PricePage {
            items,
            next_page_link: next.map(str::to_string),
        }
    }

    fn fast_policy() -> ExponentialBackoffPolicy {
        ExponentialBackoffPolicy::new(3).with_base_delay(Duration::from_millis(1))
    }

    fn unavailable() -> CostctlError {
        CostctlError::Http {
            status: 503,
            url: "https://prices.example/api".to_string(),
        }
    }

    #[tokio::test]
    async fn test_follows_next_page_link_verbatim() {
        let mut source = MockPriceSource::new();
        source
            .expect_fetch_page()
            .withf(|req| matches!(req, PageRequest::First { region } if region == "eastus"))
            .times(1)
            .returning(|_| {
                Ok(page(
                    vec![item("Standard_D4s_v3", 0.2)],
                    Some("https://prices.example/api?$skip=100"),
                ))
            });
        source
            .expect_fetch_page()
            .withf(|req| {
                *req == PageRequest::Next {
                    url: "https://prices.example/api?$skip=100".to_string(),
                }
            })
            .times(1)
            .returning(|_| Ok(page(vec![item("Standard_D8s_v3", 0.4)], None)));

        let fetcher = PriceFetcher::new(source, fast_policy());
        let outcome = fetcher.fetch_prices("eastus").await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.stats(), FetchStats { pages: 2, retries: 0 });
        let prices = outcome.into_prices();
        assert_eq!(prices.get("Standard_D4s_v3"), Some(0.2));
        assert_eq!(prices.get("Standard_D8s_v3"), Some(0.4));
    }

    #[tokio::test]
    async fn test_first_page_exhausted_is_failed() {
        let mut source = MockPriceSource::new();
        source
            .expect_fetch_page()
            .times(3)
            .returning(|_| Err(unavailable()));

        let fetcher = PriceFetcher::new(source, fast_policy());
        let outcome = fetcher.fetch_prices("eastus").await;

        assert!(matches!(outcome, FetchOutcome::Failed { .. }));
        assert_eq!(outcome.stats(), FetchStats { pages: 0, retries: 2 });
    }

    #[tokio::test]
    async fn test_later_page_exhausted_is_partial() {
        let mut source = MockPriceSource::new();
        source
            .expect_fetch_page()
            .withf(|req| matches!(req, PageRequest::First { .. }))
            .times(1)
            .returning(|_| Ok(page(vec![item("Standard_B2s", 0.05)], Some("next"))));
        source
            .expect_fetch_page()
            .withf(|req| matches!(req, PageRequest::Next { .. }))
            .times(3)
            .returning(|_| Err(unavailable()));

        let fetcher = PriceFetcher::new(source, fast_policy());
        let outcome = fetcher.fetch_prices("eastus").await;

        match outcome {
            FetchOutcome::Partial { prices, error, stats } => {
                assert_eq!(prices.get("Standard_B2s"), Some(0.05));
                assert!(matches!(error, CostctlError::Retryable { attempt: 3, .. }));
                assert_eq!(stats, FetchStats { pages: 1, retries: 2 });
            }
            other => panic!("expected partial outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_retryable_error_is_not_retried() {
        let mut source = MockPriceSource::new();
        source.expect_fetch_page().times(1).returning(|_| {
            Err(CostctlError::Validation {
                field: "region".to_string(),
                reason: "bad".to_string(),
            })
        });

        let fetcher = PriceFetcher::new(source, fast_policy());
        let outcome = fetcher.fetch_prices("eastus").await;
        assert_eq!(outcome.stats().retries, 0);
        assert!(matches!(outcome.error(), Some(CostctlError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_repeated_link_stops_pagination() {
        let mut source = MockPriceSource::new();
        source
            .expect_fetch_page()
            .times(2)
            .returning(|_| Ok(page(vec![item("Standard_B2s", 0.05)], Some("loop"))));

        let fetcher = PriceFetcher::new(source, fast_policy());
        let outcome = fetcher.fetch_prices("eastus").await;
        assert!(outcome.is_complete());
        assert_eq!(outcome.stats().pages, 2);
    }
}
