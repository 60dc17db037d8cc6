// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Live resource listings
//!
//! A [`ResourceSource`] returns provider-native descriptions, one JSON value
//! per resource, for an asset type. Projection into records happens in the
//! sync engine.

use crate::records::AssetKind;
use crate::{CatalogError, Result};
use async_trait::async_trait;
use diagnostics::*;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

#[async_trait]
pub trait ResourceSource: Debug + Send + Sync {
    /// Current descriptions of every resource of `kind`
    async fn list(&self, kind: AssetKind) -> Result<Vec<Value>>;
}

/// Listings exported to `<dir>/<AssetType>.json`, each a JSON array
///
/// A missing file lists nothing.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    dir: PathBuf,
}

impl SnapshotSource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path_for(&self, kind: AssetKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.as_str()))
    }
}

#[async_trait]
impl ResourceSource for SnapshotSource {
    async fn list(&self, kind: AssetKind) -> Result<Vec<Value>> {
        let path = self.path_for(kind);
        let failed = |message: String| CatalogError::Source {
            asset_type: kind.as_str(),
            message,
        };

        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let path = path.display().to_string();
                debug!("no snapshot at {path}", path: path);
                return Ok(Vec::new());
            }
            Err(e) => return Err(failed(format!("{}: {e}", path.display()))),
        };

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str(&text) {
            Ok(Value::Array(items)) => Ok(items),
            Ok(_) => Err(failed(format!("{} is not a JSON array", path.display()))),
            Err(e) => Err(failed(format!("{}: {e}", path.display()))),
        }
    }
}

/// In-memory listings, replaceable between cycles
#[derive(Debug, Default)]
pub struct StaticSource {
    listings: Mutex<HashMap<AssetKind, std::result::Result<Vec<Value>, String>>>,
}

impl StaticSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(self, kind: AssetKind, items: Vec<Value>) -> Self {
        self.set(kind, items);
        self
    }

    /// Replace the listing for `kind`
    pub fn set(&self, kind: AssetKind, items: Vec<Value>) {
        let _ = self.lock().insert(kind, Ok(items));
    }

    /// Make listing `kind` fail with `message`
    pub fn fail(&self, kind: AssetKind, message: &str) {
        let _ = self.lock().insert(kind, Err(message.to_string()));
    }

    fn lock(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<AssetKind, std::result::Result<Vec<Value>, String>>>
    {
        self.listings.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ResourceSource for StaticSource {
    async fn list(&self, kind: AssetKind) -> Result<Vec<Value>> {
        match self.lock().get(&kind) {
            None => Ok(Vec::new()),
            Some(Ok(items)) => Ok(items.clone()),
            Some(Err(message)) => Err(CatalogError::Source {
                asset_type: kind.as_str(),
                message: message.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_snapshot_source_reads_listing() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("Vpc.json"),
            r#"[{"VpcId": "vpc-1", "CidrBlock": "10.0.0.0/16"}]"#,
        )
        .unwrap();
        let source = SnapshotSource::new(dir.path());

        let items = source.list(AssetKind::Vpc).await.unwrap();
        assert_eq!(items, vec![json!({"VpcId": "vpc-1", "CidrBlock": "10.0.0.0/16"})]);
        assert!(source.list(AssetKind::IamRole).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_source_rejects_non_array() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("Vpc.json"), r#"{"VpcId": "vpc-1"}"#).unwrap();
        let source = SnapshotSource::new(dir.path());

        assert!(matches!(
            source.list(AssetKind::Vpc).await,
            Err(CatalogError::Source { asset_type: "Vpc", .. })
        ));
    }

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticSource::new().with(AssetKind::Vpc, vec![json!({"VpcId": "vpc-1"})]);
        assert_eq!(source.list(AssetKind::Vpc).await.unwrap().len(), 1);
        assert!(source.list(AssetKind::StorageBucket).await.unwrap().is_empty());

        source.fail(AssetKind::Vpc, "throttled");
        assert!(source.list(AssetKind::Vpc).await.is_err());
    }
}
