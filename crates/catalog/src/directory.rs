// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! The catalog's index of asset types
//!
//! One object maps each asset type name to the storage key holding its
//! record set. Entries are advisory and re-upserted on every cycle.

use crate::codec::{self, ForArrow};
use crate::records::Record;
use crate::reconcile::{Upserted, upsert};
use crate::{CatalogError, Result};
use arrow_schema::{DataType, Field, FieldRef};
use blobstore::QueuedStore;
use diagnostics::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Storage key of the directory object
pub const DIRECTORY_KEY: &str = "Assets/AssetDirectory.parquet";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct DirectoryEntry {
    pub asset_type: String,
    pub asset_table: String,
}

impl Record for DirectoryEntry {
    fn identity(&self) -> &str {
        &self.asset_type
    }
}

impl ForArrow for DirectoryEntry {
    fn for_arrow() -> Vec<FieldRef> {
        vec![
            Arc::new(Field::new("AssetType", DataType::Utf8, false)),
            Arc::new(Field::new("AssetTable", DataType::Utf8, false)),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct AssetDirectory {
    store: QueuedStore,
}

impl AssetDirectory {
    pub fn new(store: QueuedStore) -> Self {
        Self { store }
    }

    /// Point `asset_type` at `storage_key`
    ///
    /// Runs as one queued read-modify-write of the directory object, so
    /// concurrent upserts for different asset types all survive.
    pub async fn upsert(&self, asset_type: &str, storage_key: &str) -> Result<Upserted> {
        let entry = DirectoryEntry {
            asset_type: asset_type.to_string(),
            asset_table: storage_key.to_string(),
        };
        let outcome = self
            .store
            .update(DIRECTORY_KEY, move |current| {
                let mut entries: Vec<DirectoryEntry> = codec::decode_optional(current)?;
                let outcome = upsert(&mut entries, entry);
                Ok::<_, CatalogError>((codec::encode(&entries)?, outcome))
            })
            .await?;

        match outcome {
            Upserted::Inserted => {
                info!(
                    "directory: added {asset_type} at {storage_key}",
                    asset_type: asset_type,
                    storage_key: storage_key
                );
            }
            Upserted::Replaced => {
                info!(
                    "directory: moved {asset_type} to {storage_key}",
                    asset_type: asset_type,
                    storage_key: storage_key
                );
            }
            Upserted::Unchanged => {
                debug!("directory: {asset_type} unchanged", asset_type: asset_type);
            }
        }
        Ok(outcome)
    }

    /// All entries, in insertion order
    pub async fn entries(&self) -> Result<Vec<DirectoryEntry>> {
        codec::decode_optional(self.store.load(DIRECTORY_KEY).await?)
    }

    /// Storage key registered for `asset_type`
    pub async fn lookup(&self, asset_type: &str) -> Result<Option<String>> {
        Ok(self
            .entries()
            .await?
            .into_iter()
            .find(|entry| entry.asset_type == asset_type)
            .map(|entry| entry.asset_table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobstore::{GatewayOptions, ObjectGateway, StagingArea, WriteQueue};
    use object_store::ObjectStore;
    use object_store::memory::InMemory;
    use tempfile::tempdir;

    fn directory(dir: &std::path::Path) -> AssetDirectory {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let gateway = ObjectGateway::for_store(
            store,
            StagingArea::new(dir).unwrap(),
            GatewayOptions::default(),
        );
        AssetDirectory::new(QueuedStore::new(Arc::new(gateway), WriteQueue::new()))
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let tmp = tempdir().unwrap();
        let directory = directory(tmp.path());
        assert!(directory.entries().await.unwrap().is_empty());
        assert_eq!(directory.lookup("Vpc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_upsert_same_type_twice_keeps_one_entry() {
        let tmp = tempdir().unwrap();
        let directory = directory(tmp.path());

        assert_eq!(
            directory.upsert("Vpc", "Assets/Vpcinventory.parquet").await.unwrap(),
            Upserted::Inserted
        );
        assert_eq!(
            directory.upsert("Vpc", "Assets/Vpcinventory-v2.parquet").await.unwrap(),
            Upserted::Replaced
        );
        assert_eq!(
            directory.upsert("Vpc", "Assets/Vpcinventory-v2.parquet").await.unwrap(),
            Upserted::Unchanged
        );

        let entries = directory.entries().await.unwrap();
        assert_eq!(
            entries,
            vec![DirectoryEntry {
                asset_type: "Vpc".to_string(),
                asset_table: "Assets/Vpcinventory-v2.parquet".to_string(),
            }]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upserts_of_different_types_all_survive() {
        let tmp = tempdir().unwrap();
        let directory = directory(tmp.path());

        let names: Vec<String> = (0..12).map(|i| format!("Type{i}")).collect();
        let tasks = names.iter().cloned().map(|name| {
            let directory = directory.clone();
            tokio::spawn(async move {
                let key = format!("Assets/{name}inventory.parquet");
                directory.upsert(&name, &key).await
            })
        });
        for task in futures::future::join_all(tasks).await {
            let _ = task.unwrap().unwrap();
        }

        let entries = directory.entries().await.unwrap();
        assert_eq!(entries.len(), names.len());
        for name in &names {
            assert_eq!(
                directory.lookup(name).await.unwrap(),
                Some(format!("Assets/{name}inventory.parquet"))
            );
        }
    }
}
