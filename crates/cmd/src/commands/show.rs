// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::common::open_catalog;
use anyhow::{Context, Result};
use catalog::{AssetKind, CatalogConfig};

/// The stored record set of one asset type, one JSON object per line
pub async fn show_command_as_string(
    config: &CatalogConfig,
    asset_type: &str,
    stale_only: bool,
) -> Result<String> {
    let kind: AssetKind = asset_type.parse()?;
    let catalog = open_catalog(config)?;
    let records = catalog
        .load_json(kind, stale_only)
        .await
        .with_context(|| format!("Failed to load {kind} records"))?;

    let mut output = String::new();
    for record in records {
        output.push_str(&serde_json::to_string(&record)?);
        output.push('\n');
    }
    Ok(output)
}

#[allow(clippy::print_stdout)]
pub async fn show_command(config: &CatalogConfig, asset_type: &str, stale_only: bool) -> Result<()> {
    print!("{}", show_command_as_string(config, asset_type, stale_only).await?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::sync::run_sync;
    use crate::common::testing::config_in;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_show_lists_records_and_filters_stale() {
        let tmp = tempdir().unwrap();
        let config = config_in(tmp.path());
        let listing = config.source.snapshot_dir.join("StorageBucket.json");

        std::fs::write(&listing, r#"[{"Name": "logs"}, {"Name": "models"}]"#).unwrap();
        let _ = run_sync(&config, &["StorageBucket".to_string()]).await.unwrap();
        std::fs::write(&listing, r#"[{"Name": "models"}]"#).unwrap();
        let _ = run_sync(&config, &["StorageBucket".to_string()]).await.unwrap();

        let all = show_command_as_string(&config, "StorageBucket", false).await.unwrap();
        assert_eq!(all.lines().count(), 2);

        let stale = show_command_as_string(&config, "StorageBucket", true).await.unwrap();
        let lines: Vec<&str> = stale.lines().collect();
        assert_eq!(lines.len(), 1);
        let record: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(record["UniqueId"], "logs");
        assert_eq!(record["IsStale"], true);
    }

    #[tokio::test]
    async fn test_show_unknown_or_empty_type() {
        let tmp = tempdir().unwrap();
        let config = config_in(tmp.path());
        assert!(show_command_as_string(&config, "Printer", false).await.is_err());
        assert_eq!(show_command_as_string(&config, "Vpc", false).await.unwrap(), "");
    }
}
