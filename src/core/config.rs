//! Configuration parsing and validation.
//!
//! Configuration is loaded from TOML files with CLI overrides. Every section
//! is optional; an empty file yields a usable configuration that routes all
//! traffic to the default endpoint.

use crate::routing::range::MAX_EXCLUSIVE_EFFECTIVE_PARTITION_KEY;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Regional endpoint selection.
    #[serde(default)]
    pub location: LocationConfig,

    /// Partition routing.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Logging configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Location cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Account endpoint used when discovery is disabled or no region is known.
    #[serde(default = "default_endpoint")]
    pub default_endpoint: String,

    /// Regions in order of preference.
    #[serde(default)]
    pub preferred_locations: Vec<String>,

    /// Whether regional endpoints from the account topology are used at all.
    #[serde(default = "default_true")]
    pub enable_endpoint_discovery: bool,

    /// Whether writes may target any write region the account exposes.
    #[serde(default)]
    pub use_multiple_write_locations: bool,

    /// How long an endpoint stays demoted after a failure.
    #[serde(default = "default_unavailable_ttl_seconds")]
    pub unavailable_ttl_seconds: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            default_endpoint: default_endpoint(),
            preferred_locations: Vec::new(),
            enable_endpoint_discovery: true,
            use_multiple_write_locations: false,
            unavailable_ttl_seconds: default_unavailable_ttl_seconds(),
        }
    }
}

impl LocationConfig {
    /// Unavailability TTL as a duration.
    pub fn unavailable_ttl(&self) -> Duration {
        Duration::from_secs(self.unavailable_ttl_seconds)
    }

    /// Parse the default endpoint.
    pub fn default_endpoint_url(&self) -> Result<Url> {
        Url::parse(&self.default_endpoint)
            .with_context(|| format!("invalid default_endpoint: {}", self.default_endpoint))
    }
}

/// Partition routing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Exclusive upper bound of the effective partition key space.
    #[serde(default = "default_max_exclusive_key")]
    pub max_exclusive_key: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            max_exclusive_key: default_max_exclusive_key(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// Default value functions

fn default_endpoint() -> String {
    "https://localhost:8081/".to_string()
}

fn default_true() -> bool {
    true
}

fn default_unavailable_ttl_seconds() -> u64 {
    300
}

fn default_max_exclusive_key() -> String {
    MAX_EXCLUSIVE_EFFECTIVE_PARTITION_KEY.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| "failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).with_context(|| "failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides to the configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref log_level) = overrides.log_level {
            self.telemetry.log_level = log_level.clone();
        }
        if let Some(ref default_endpoint) = overrides.default_endpoint {
            self.location.default_endpoint = default_endpoint.clone();
        }
        if let Some(ref preferred) = overrides.preferred_locations {
            self.location.preferred_locations = preferred.clone();
        }
        if overrides.disable_endpoint_discovery {
            self.location.enable_endpoint_discovery = false;
        }
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> Result<()> {
        self.validate_location()?;
        self.validate_routing()?;
        self.validate_telemetry()?;
        Ok(())
    }

    fn validate_location(&self) -> Result<()> {
        let url = self.location.default_endpoint_url()?;
        if url.cannot_be_a_base() {
            anyhow::bail!(
                "location.default_endpoint must be an absolute URL, got: {}",
                self.location.default_endpoint
            );
        }

        if self.location.unavailable_ttl_seconds == 0 {
            anyhow::bail!("location.unavailable_ttl_seconds must be > 0");
        }

        let mut seen = HashSet::new();
        for location in &self.location.preferred_locations {
            if location.trim().is_empty() {
                anyhow::bail!("location.preferred_locations must not contain empty names");
            }
            if !seen.insert(location.as_str()) {
                anyhow::bail!(
                    "location.preferred_locations contains duplicate region: {}",
                    location
                );
            }
        }

        Ok(())
    }

    fn validate_routing(&self) -> Result<()> {
        if self.routing.max_exclusive_key != MAX_EXCLUSIVE_EFFECTIVE_PARTITION_KEY {
            anyhow::bail!(
                "routing.max_exclusive_key must be '{}', got: {}",
                MAX_EXCLUSIVE_EFFECTIVE_PARTITION_KEY,
                self.routing.max_exclusive_key
            );
        }
        Ok(())
    }

    fn validate_telemetry(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.telemetry.log_level.as_str()) {
            anyhow::bail!(
                "telemetry.log_level must be one of {:?}, got: {}",
                valid_levels,
                self.telemetry.log_level
            );
        }
        Ok(())
    }
}

/// CLI override options that can be applied to configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override log level.
    pub log_level: Option<String>,
    /// Override default endpoint.
    pub default_endpoint: Option<String>,
    /// Override preferred locations.
    pub preferred_locations: Option<Vec<String>>,
    /// Force endpoint discovery off.
    pub disable_endpoint_discovery: bool,
}
