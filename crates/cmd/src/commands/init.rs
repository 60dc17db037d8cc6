// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use catalog::create_example_config;
use diagnostics::*;
use std::path::Path;

/// Write an example configuration unless one already exists
///
/// Returns whether a file was written.
pub fn init_command(config_path: &Path) -> Result<bool> {
    let path = config_path.display().to_string();
    if config_path.exists() {
        info!("Configuration file already exists: {path}", path: path);
        info!("Delete it first if you want to create a new one.");
        return Ok(false);
    }

    create_example_config(config_path)
        .with_context(|| format!("Failed to create configuration file: {path}"))?;

    info!("Created example configuration file: {path}", path: path);
    info!("Edit store.url, staging_dir and source.snapshot_dir, then run: assetcat sync");
    Ok(true)
}
