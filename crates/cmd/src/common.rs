// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result, anyhow};
use blobstore::{ObjectGateway, QueuedStore, StagingArea, WriteQueue, build_object_store};
use catalog::{CatalogConfig, CatalogSync, SnapshotSource, load_config};
use diagnostics::*;
use std::path::Path;
use std::sync::Arc;

/// Default configuration file name
pub const DEFAULT_CONFIG: &str = "assetcat.yaml";

/// Load and validate the configuration at `config_path`
pub fn load_catalog_config(config_path: &Path) -> Result<CatalogConfig> {
    if !config_path.exists() {
        return Err(anyhow!(
            "Configuration file not found: {}. Run 'assetcat init' to create one.",
            config_path.display()
        ));
    }
    let path = config_path.display().to_string();
    debug!("loading configuration from {path}", path: path);
    load_config(config_path)
        .with_context(|| format!("Failed to load configuration from: {}", config_path.display()))
}

/// The blob store, staged and queued as configured
pub fn open_store(config: &CatalogConfig) -> Result<QueuedStore> {
    let store = build_object_store(&config.store)
        .with_context(|| format!("Failed to open store {}", config.store.url))?;
    let staging = StagingArea::new(&config.staging_dir).with_context(|| {
        format!("Failed to prepare staging directory {}", config.staging_dir.display())
    })?;
    let gateway = ObjectGateway::for_store(store, staging, config.gateway_options());
    Ok(QueuedStore::new(Arc::new(gateway), WriteQueue::new()))
}

/// A sync engine reading listings from the configured snapshot directory
pub fn open_catalog(config: &CatalogConfig) -> Result<CatalogSync> {
    let store = open_store(config)?;
    let source = SnapshotSource::new(&config.source.snapshot_dir);
    Ok(CatalogSync::new(store, Arc::new(source)))
}
