// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::common::open_catalog;
use anyhow::{Context, Result, bail};
use catalog::{AiFlowMatch, CatalogConfig, CycleReport, correlate, parse_flow_lines};
use diagnostics::*;
use std::path::Path;

/// Correlate a flow log against the configured AI endpoints and record the matches
pub async fn run_flows(config: &CatalogConfig, input: &Path) -> Result<CycleReport> {
    let registry = config.endpoint_registry()?;
    if registry.is_empty() {
        bail!("No ai_endpoints are configured; nothing to match flows against");
    }

    let text = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read flow log: {}", input.display()))?;
    let (flows, skipped) = parse_flow_lines(&text);
    let matches = correlate(&flows, &registry);

    let catalog = open_catalog(config)?;
    let mut report = catalog.sync_observed::<AiFlowMatch>(matches).await?;
    report.fetched = flows.len() + skipped;
    report.skipped = skipped;

    let path = input.display().to_string();
    let total = report.total;
    info!("recorded flow matches from {path}: {total} in catalog", path: path, total: total);
    Ok(report)
}

#[allow(clippy::print_stdout)]
pub async fn flows_command(config: &CatalogConfig, input: &Path) -> Result<()> {
    let report = run_flows(config, input).await?;
    println!("{report}");
    Ok(())
}
