//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use costctl::error::{CostctlError, Result};
use costctl::pricing::{PageRequest, PricePage, PriceSource, RetailPriceItem};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Price source that replays a fixed list of responses and records requests
pub struct ScriptedSource {
    responses: Mutex<VecDeque<Result<PricePage>>>,
    requests: Mutex<Vec<PageRequest>>,
}

impl ScriptedSource {
    pub fn new(responses: Vec<Result<PricePage>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceSource for ScriptedSource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<PricePage> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CostctlError::Decode("script exhausted".to_string())))
    }
}

pub fn item(sku: &str, price: f64) -> RetailPriceItem {
    RetailPriceItem {
        arm_sku_name: Some(sku.to_string()),
        retail_price: Some(price),
        ..Default::default()
    }
}

pub fn page(items: &[(&str, f64)], next: Option<&str>) -> PricePage {
    PricePage {
        items: items.iter().map(|(sku, price)| item(sku, *price)).collect(),
        next_page_link: next.map(str::to_string),
    }
}

pub fn transient() -> CostctlError {
    CostctlError::Transport {
        message: "connection reset".to_string(),
        source: None,
    }
}
