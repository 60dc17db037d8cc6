// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! YAML configuration for the catalog

use crate::flows::EndpointRegistry;
use crate::records::AssetKind;
use anyhow::{Context, Result};
use blobstore::{GatewayOptions, StoreConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CatalogConfig {
    pub store: StoreConfig,

    /// Local directory for staging object transfers
    pub staging_dir: PathBuf,

    /// Limit for each remote call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub operation_timeout_secs: u64,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub source: SourceConfig,

    /// Asset types to synchronize; empty means every inventory type
    #[serde(default)]
    pub asset_types: Vec<String>,

    /// Service name to known endpoint addresses
    #[serde(default)]
    pub ai_endpoints: BTreeMap<String, Vec<String>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RetryConfig {
    /// Attempts per operation, including the first
    pub max_attempts: usize,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            min_delay_ms: 100,
            max_delay_ms: 5000,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SourceConfig {
    /// Directory of `<AssetType>.json` listings
    pub snapshot_dir: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: PathBuf::from("./snapshots"),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

impl CatalogConfig {
    #[must_use]
    pub fn gateway_options(&self) -> GatewayOptions {
        GatewayOptions {
            operation_timeout: Duration::from_secs(self.operation_timeout_secs),
            max_attempts: self.retry.max_attempts,
            min_delay: Duration::from_millis(self.retry.min_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
        }
    }

    /// The configured asset types, or every inventory type if none are named
    pub fn selected_kinds(&self) -> crate::Result<Vec<AssetKind>> {
        if self.asset_types.is_empty() {
            return Ok(AssetKind::INVENTORY.to_vec());
        }
        self.asset_types.iter().map(|name| name.parse()).collect()
    }

    pub fn endpoint_registry(&self) -> crate::Result<EndpointRegistry> {
        EndpointRegistry::from_config(&self.ai_endpoints)
    }
}

/// Load configuration from YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CatalogConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

    let config: CatalogConfig =
        serde_yaml_ng::from_str(&content).with_context(|| "Failed to parse YAML configuration")?;

    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration
pub fn validate_config(config: &CatalogConfig) -> Result<()> {
    if config.store.url.trim().is_empty() {
        anyhow::bail!("store.url cannot be empty");
    }
    if config.staging_dir.as_os_str().is_empty() {
        anyhow::bail!("staging_dir cannot be empty");
    }
    if config.operation_timeout_secs == 0 {
        anyhow::bail!("operation_timeout_secs must be greater than 0");
    }
    if config.retry.max_attempts == 0 {
        anyhow::bail!("retry.max_attempts must be at least 1");
    }
    if config.retry.min_delay_ms > config.retry.max_delay_ms {
        anyhow::bail!("retry.min_delay_ms cannot exceed retry.max_delay_ms");
    }

    let _ = config.selected_kinds()?;
    let _ = config.endpoint_registry()?;
    Ok(())
}

pub const EXAMPLE_CONFIG: &str = r#"# Asset catalog configuration

store:
  # file:///path, memory://, or s3://bucket/optional/prefix
  url: "file:///var/lib/assetcat"
  # S3 only; leave empty to use the environment
  region: ""
  endpoint: ""
  access_key: ""
  secret_key: ""

# Local directory for staging object transfers
staging_dir: "/tmp/assetcat-staging"

# Limit for each remote call
operation_timeout_secs: 30

retry:
  max_attempts: 4
  min_delay_ms: 100
  max_delay_ms: 5000

source:
  # One <AssetType>.json listing per asset type
  snapshot_dir: "./snapshots"

# Empty means every inventory type:
# ComputeInstance, NetworkInterface, SecurityGroup, Vpc, IamRole,
# LambdaFunction, StorageBucket
asset_types: []

# Known AI service endpoints, by service name
ai_endpoints:
  openai: ["104.18.6.192", "104.18.7.192"]
"#;

/// Write a commented example configuration to `path`
pub fn create_example_config<P: AsRef<Path>>(path: P) -> Result<()> {
    std::fs::write(&path, EXAMPLE_CONFIG)
        .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))
}
