// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::common::open_catalog;
use anyhow::{Result, anyhow};
use catalog::{AssetKind, CatalogConfig, RunSummary};

/// Asset types to run: the command line wins over the configuration
pub fn resolve_kinds(config: &CatalogConfig, requested: &[String]) -> Result<Vec<AssetKind>> {
    if requested.is_empty() {
        return Ok(config.selected_kinds()?);
    }
    requested
        .iter()
        .map(|name| name.parse::<AssetKind>().map_err(anyhow::Error::from))
        .collect()
}

/// Run one collection cycle for each selected asset type
pub async fn run_sync(config: &CatalogConfig, requested: &[String]) -> Result<RunSummary> {
    let kinds = resolve_kinds(config, requested)?;
    let catalog = open_catalog(config)?;
    Ok(catalog.sync_all(&kinds).await)
}

#[must_use]
pub fn format_summary(summary: &RunSummary) -> String {
    let mut output = String::new();
    for report in &summary.reports {
        output.push_str(&format!("{report}\n"));
    }
    for (kind, error) in &summary.failures {
        output.push_str(&format!("{kind}: FAILED: {error}\n"));
    }
    output
}

#[allow(clippy::print_stdout)]
pub async fn sync_command(config: &CatalogConfig, requested: &[String]) -> Result<()> {
    let summary = run_sync(config, requested).await?;
    print!("{}", format_summary(&summary));
    if summary.is_success() {
        Ok(())
    } else {
        Err(anyhow!(
            "{} of {} asset types failed to synchronize",
            summary.failures.len(),
            summary.failures.len() + summary.reports.len()
        ))
    }
}
