use crate::catalog::{Catalog, RoleDefinition};
use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

pub const DEFAULT_ENDPOINT: &str = "https://prices.azure.com/api/retail/prices";
pub const DEFAULT_REGION: &str = "eastus";
pub const DEFAULT_HOURS_IN_MONTH: f64 = 730.0;
/// 31 days of 24 hours
pub const MAX_HOURS_IN_MONTH: f64 = 744.0;
const MAX_BASE_DELAY_SECS: f64 = 3600.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pricing: PricingConfig,
    pub estimate: EstimateConfig,
    /// Catalog override; the built-in catalog is used when empty
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<RoleDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub endpoint: String,
    pub region: String,
    pub max_attempts: u32,
    pub base_delay_secs: f64,
    pub jitter_factor: f64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateConfig {
    pub hours_in_month: f64,
    pub missing_sku: MissingSkuPolicy,
    pub allow_partial_prices: bool,
}

/// What the estimator does when a recommended SKU has no price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingSkuPolicy {
    /// Report the role as unpriced and count it as zero
    #[default]
    Skip,
    /// Abort the estimate
    Fail,
}

impl FromStr for MissingSkuPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(MissingSkuPolicy::Skip),
            "fail" => Ok(MissingSkuPolicy::Fail),
            other => Err(ConfigError::InvalidValue {
                field: "missing_sku".to_string(),
                reason: format!("expected 'skip' or 'fail', got '{}'", other),
            }),
        }
    }
}

impl fmt::Display for MissingSkuPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingSkuPolicy::Skip => f.write_str("skip"),
            MissingSkuPolicy::Fail => f.write_str("fail"),
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            region: DEFAULT_REGION.to_string(),
            max_attempts: 3,
            base_delay_secs: 1.0,
            jitter_factor: 0.0,
            request_timeout_secs: 30,
        }
    }
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            hours_in_month: DEFAULT_HOURS_IN_MONTH,
            missing_sku: MissingSkuPolicy::Skip,
            allow_partial_prices: true,
        }
    }
}

impl Config {
    /// Load configuration
    ///
    /// Lookup order: explicit path, `./.costctl.toml`,
    /// `<config_dir>/costctl/config.toml`, built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            let local = PathBuf::from(".costctl.toml");
            if local.exists() {
                local
            } else {
                dirs::config_dir()
                    .map(|d| d.join("costctl").join("config.toml"))
                    .unwrap_or(local)
            }
        };

        if !config_path.exists() {
            if path.is_some() {
                warn!(
                    "Config file not found: {}; using defaults (run 'costctl init' to create one)",
                    config_path.display()
                );
            }
            return Ok(Config::default());
        }

        debug!("Loading config from {}", config_path.display());
        let content = std::fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            ConfigError::ParseError(format!("{}: {}", config_path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.pricing.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingField("pricing.endpoint".to_string()));
        }
        if self.pricing.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pricing.max_attempts".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        let delay = self.pricing.base_delay_secs;
        if !delay.is_finite() || !(0.0..=MAX_BASE_DELAY_SECS).contains(&delay) {
            return Err(ConfigError::InvalidValue {
                field: "pricing.base_delay_secs".to_string(),
                reason: format!("must be between 0 and {} seconds", MAX_BASE_DELAY_SECS),
            });
        }
        let hours = self.estimate.hours_in_month;
        if !hours.is_finite() || hours <= 0.0 || hours > MAX_HOURS_IN_MONTH {
            return Err(ConfigError::InvalidValue {
                field: "estimate.hours_in_month".to_string(),
                reason: format!("must be greater than zero and at most {}", MAX_HOURS_IN_MONTH),
            });
        }
        if !self.roles.is_empty() {
            self.catalog()?;
        }
        Ok(())
    }

    /// Build the validated catalog this config describes
    pub fn catalog(&self) -> std::result::Result<Catalog, ConfigError> {
        if self.roles.is_empty() {
            Ok(Catalog::builtin())
        } else {
            Catalog::from_definitions(self.roles.clone())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

pub fn init_config(output: &Path) -> Result<()> {
    Config::default().save(output)?;
    println!("Created config file: {}", output.display());
    Ok(())
}
