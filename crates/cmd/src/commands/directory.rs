// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::common::open_catalog;
use anyhow::Result;
use catalog::CatalogConfig;

/// Directory entries as tab-separated `AssetType`, `AssetTable` lines
pub async fn directory_command_as_string(config: &CatalogConfig) -> Result<String> {
    let catalog = open_catalog(config)?;
    let mut entries = catalog.directory().entries().await?;
    entries.sort_by(|a, b| a.asset_type.cmp(&b.asset_type));

    let mut output = String::from("AssetType\tAssetTable\n");
    for entry in entries {
        output.push_str(&format!("{}\t{}\n", entry.asset_type, entry.asset_table));
    }
    Ok(output)
}

#[allow(clippy::print_stdout)]
pub async fn directory_command(config: &CatalogConfig) -> Result<()> {
    print!("{}", directory_command_as_string(config).await?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::sync::run_sync;
    use crate::common::testing::config_in;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_directory_lists_synchronized_types() {
        let tmp = tempdir().unwrap();
        let config = config_in(tmp.path());
        assert_eq!(
            directory_command_as_string(&config).await.unwrap(),
            "AssetType\tAssetTable\n"
        );

        let _ = run_sync(&config, &["Vpc".to_string(), "IamRole".to_string()])
            .await
            .unwrap();
        let output = directory_command_as_string(&config).await.unwrap();
        assert_eq!(
            output,
            "AssetType\tAssetTable\n\
             IamRole\tAssets/IamRoleinventory.parquet\n\
             Vpc\tAssets/Vpcinventory.parquet\n"
        );
    }
}
