//! VM size recommendation
//!
//! Maps a subscriber count and price tolerance to one VM SKU per catalog
//! role. Pure and deterministic: no I/O, no state beyond the catalog passed in.

use crate::catalog::{Catalog, PayerSize, PriceTolerance, WorkloadType};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Selected VM for one role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub vm_sku: String,
    pub workload_type: WorkloadType,
    pub server_count: u32,
}

/// Role name to recommendation
pub type Recommendations = BTreeMap<String, Recommendation>;

/// Recommend a VM SKU for every role in the catalog
pub fn recommend(
    catalog: &Catalog,
    subscriber_count: u64,
    tolerance: PriceTolerance,
) -> Result<Recommendations> {
    let payer = PayerSize::classify(subscriber_count);
    let mut recommendations = Recommendations::new();

    for role in catalog.roles() {
        let sku = role.tier(tolerance)?.sku_for(payer);
        debug!("{} ({} payer, {}): {}", role.name, payer, tolerance, sku);
        recommendations.insert(
            role.name.clone(),
            Recommendation {
                vm_sku: sku.to_string(),
                workload_type: role.workload_type,
                server_count: role.server_count,
            },
        );
    }

    Ok(recommendations)
}

/// Same as `recommend`, taking the tolerance as user input
///
/// Unknown tolerance names fail with `ConfigError::InvalidTolerance`.
pub fn recommend_str(
    catalog: &Catalog,
    subscriber_count: u64,
    tolerance: &str,
) -> Result<Recommendations> {
    let tolerance: PriceTolerance = tolerance.parse()?;
    recommend(catalog, subscriber_count, tolerance)
}
