//! Server role catalog
//!
//! The catalog lists the server roles an environment needs and, for each
//! price tolerance, the VM SKU to use for small and large payers. It is
//! built once (built-in or from the config file), validated, and then passed
//! by reference to the recommender. Nothing here is global or mutable.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Subscriber count at which a payer moves from the small to the large tier.
pub const LARGE_PAYER_THRESHOLD: u64 = 1_000_000;

/// Caller-chosen preference that selects the VM series tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceTolerance {
    CostOptimized,
    Balanced,
    PerformanceFirst,
}

impl PriceTolerance {
    pub const ALL: [PriceTolerance; 3] = [
        PriceTolerance::CostOptimized,
        PriceTolerance::Balanced,
        PriceTolerance::PerformanceFirst,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTolerance::CostOptimized => "cost-optimized",
            PriceTolerance::Balanced => "balanced",
            PriceTolerance::PerformanceFirst => "performance-first",
        }
    }
}

impl fmt::Display for PriceTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceTolerance {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        PriceTolerance::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| ConfigError::InvalidTolerance(s.to_string()))
    }
}

/// Kind of workload a role runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadType {
    Database,
    Application,
}

impl fmt::Display for WorkloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkloadType::Database => f.write_str("database"),
            WorkloadType::Application => f.write_str("application"),
        }
    }
}

/// Payer segment derived from the subscriber count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayerSize {
    Small,
    Large,
}

impl PayerSize {
    /// Classify a subscriber count. Exactly `LARGE_PAYER_THRESHOLD` is large.
    pub fn classify(subscriber_count: u64) -> Self {
        if subscriber_count < LARGE_PAYER_THRESHOLD {
            PayerSize::Small
        } else {
            PayerSize::Large
        }
    }
}

impl fmt::Display for PayerSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayerSize::Small => f.write_str("small"),
            PayerSize::Large => f.write_str("large"),
        }
    }
}

/// SKUs for one tolerance tier of a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeThresholds {
    pub small_sku: String,
    pub large_sku: String,
}

impl SizeThresholds {
    pub fn new(small_sku: impl Into<String>, large_sku: impl Into<String>) -> Self {
        Self {
            small_sku: small_sku.into(),
            large_sku: large_sku.into(),
        }
    }

    pub fn sku_for(&self, payer: PayerSize) -> &str {
        match payer {
            PayerSize::Small => &self.small_sku,
            PayerSize::Large => &self.large_sku,
        }
    }
}

/// A validated server role
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerRoleSpec {
    pub name: String,
    pub workload_type: WorkloadType,
    pub description: String,
    pub server_count: u32,
    pub tiers: BTreeMap<PriceTolerance, SizeThresholds>,
}

impl ServerRoleSpec {
    pub fn tier(&self, tolerance: PriceTolerance) -> Result<&SizeThresholds, ConfigError> {
        self.tiers
            .get(&tolerance)
            .ok_or_else(|| ConfigError::MissingTier {
                role: self.name.clone(),
                tolerance: tolerance.to_string(),
            })
    }
}

/// Role as written in the config file (`[[roles]]`)
///
/// Tier keys are plain strings here so a misspelled tolerance surfaces as
/// `ConfigError::InvalidTolerance` instead of a TOML type error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub name: String,
    pub workload_type: WorkloadType,
    #[serde(default)]
    pub description: String,
    pub server_count: u32,
    pub tiers: BTreeMap<String, SizeThresholds>,
}

impl TryFrom<RoleDefinition> for ServerRoleSpec {
    type Error = ConfigError;

    fn try_from(def: RoleDefinition) -> Result<Self, Self::Error> {
        let mut tiers = BTreeMap::new();
        for (key, thresholds) in def.tiers {
            tiers.insert(key.parse::<PriceTolerance>()?, thresholds);
        }
        Ok(ServerRoleSpec {
            name: def.name,
            workload_type: def.workload_type,
            description: def.description,
            server_count: def.server_count,
            tiers,
        })
    }
}

/// Immutable, validated set of server roles
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    roles: Vec<ServerRoleSpec>,
}

impl Catalog {
    /// Validate and wrap a list of roles
    ///
    /// Rejects an empty list, duplicate names, zero server counts, empty SKUs
    /// and roles missing any of the three tolerance tiers.
    pub fn new(roles: Vec<ServerRoleSpec>) -> Result<Self, ConfigError> {
        if roles.is_empty() {
            return Err(ConfigError::MissingField("roles".to_string()));
        }

        let mut seen = HashSet::new();
        for role in &roles {
            if role.name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "roles.name".to_string(),
                    reason: "role name must not be empty".to_string(),
                });
            }
            if !seen.insert(role.name.as_str()) {
                return Err(ConfigError::DuplicateRole(role.name.clone()));
            }
            if role.server_count == 0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("roles.{}.server_count", role.name),
                    reason: "must be at least 1".to_string(),
                });
            }
            for tolerance in PriceTolerance::ALL {
                let tier = role.tier(tolerance)?;
                if tier.small_sku.trim().is_empty() || tier.large_sku.trim().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: format!("roles.{}.tiers.{}", role.name, tolerance),
                        reason: "SKU must not be empty".to_string(),
                    });
                }
            }
        }

        Ok(Self { roles })
    }

    pub fn from_definitions(defs: Vec<RoleDefinition>) -> Result<Self, ConfigError> {
        let roles = defs
            .into_iter()
            .map(ServerRoleSpec::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(roles)
    }

    /// The built-in catalog: a SQL Server database role and a batch processor role.
    pub fn builtin() -> Self {
        let sql_server = ServerRoleSpec {
            name: "SQL Server".to_string(),
            workload_type: WorkloadType::Database,
            description: "Primary database server for OLTP workloads.".to_string(),
            server_count: 1,
            tiers: BTreeMap::from([
                (
                    PriceTolerance::CostOptimized,
                    SizeThresholds::new("Standard_D2as_v5", "Standard_DS4_v2"),
                ),
                (
                    PriceTolerance::Balanced,
                    SizeThresholds::new("Standard_D4s_v3", "Standard_D8s_v3"),
                ),
                (
                    PriceTolerance::PerformanceFirst,
                    SizeThresholds::new("Standard_E8s_v3", "Standard_E16s_v3"),
                ),
            ]),
        };
        let batch_processor = ServerRoleSpec {
            name: "Batch Processor".to_string(),
            workload_type: WorkloadType::Application,
            description: "Windows server for nightly batch jobs.".to_string(),
            server_count: 2,
            tiers: BTreeMap::from([
                (
                    PriceTolerance::CostOptimized,
                    SizeThresholds::new("Standard_B2s", "Standard_B4ms"),
                ),
                (
                    PriceTolerance::Balanced,
                    SizeThresholds::new("Standard_D2s_v3", "Standard_D4s_v3"),
                ),
                (
                    PriceTolerance::PerformanceFirst,
                    SizeThresholds::new("Standard_F4s_v2", "Standard_F8s_v2"),
                ),
            ]),
        };

        Self {
            roles: vec![sql_server, batch_processor],
        }
    }

    pub fn roles(&self) -> &[ServerRoleSpec] {
        &self.roles
    }

    pub fn get(&self, name: &str) -> Option<&ServerRoleSpec> {
        self.roles.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_parse() {
        assert_eq!("balanced".parse::<PriceTolerance>().unwrap(), PriceTolerance::Balanced);
        assert_eq!(
            " Performance-First ".parse::<PriceTolerance>().unwrap(),
            PriceTolerance::PerformanceFirst
        );
        assert_eq!(
            "premium".parse::<PriceTolerance>(),
            Err(ConfigError::InvalidTolerance("premium".to_string()))
        );
    }

    #[test]
    fn test_payer_classification_boundary() {
        assert_eq!(PayerSize::classify(0), PayerSize::Small);
        assert_eq!(PayerSize::classify(999_999), PayerSize::Small);
        assert_eq!(PayerSize::classify(1_000_000), PayerSize::Large);
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 2);
        assert!(Catalog::new(catalog.roles().to_vec()).is_ok());
        assert_eq!(catalog.get("Batch Processor").unwrap().server_count, 2);
    }

    #[test]
    fn test_catalog_rejects_missing_tier() {
        let mut role = Catalog::builtin().roles()[0].clone();
        role.tiers.remove(&PriceTolerance::Balanced);
        let err = Catalog::new(vec![role]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingTier { ref tolerance, .. } if tolerance == "balanced"));
    }

    #[test]
    fn test_catalog_rejects_duplicates_and_zero_count() {
        let role = Catalog::builtin().roles()[0].clone();
        let err = Catalog::new(vec![role.clone(), role.clone()]).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateRole("SQL Server".to_string()));

        let mut empty = role;
        empty.server_count = 0;
        assert!(matches!(
            Catalog::new(vec![empty]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(Catalog::new(vec![]), Err(ConfigError::MissingField(_))));
    }

    #[test]
    fn test_definition_with_unknown_tier_key() {
        let def = RoleDefinition {
            name: "API".to_string(),
            workload_type: WorkloadType::Application,
            description: String::new(),
            server_count: 1,
            tiers: BTreeMap::from([(
                "premium".to_string(),
                SizeThresholds::new("Standard_B1s", "Standard_B2s"),
            )]),
        };
        assert_eq!(
            Catalog::from_definitions(vec![def]).unwrap_err(),
            ConfigError::InvalidTolerance("premium".to_string())
        );
    }
}
