// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Blob store location and credentials

use crate::{Result, StoreError};
use object_store::ObjectStore;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::prefix::PrefixStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// Where the catalog objects live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// `file:///path`, `memory://`, or `s3://bucket/optional/prefix`
    pub url: String,

    /// AWS region (for S3)
    #[serde(default)]
    pub region: String,

    /// Custom S3 endpoint (for MinIO, R2, etc.)
    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub access_key: String,

    #[serde(default)]
    pub secret_key: String,
}

impl StoreConfig {
    #[must_use]
    pub fn local<S: Into<String>>(path: S) -> Self {
        Self {
            url: format!("file://{}", path.into()),
            region: String::new(),
            endpoint: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
        }
    }
}

/// Build the `object_store` implementation named by `config.url`
pub fn build_object_store(config: &StoreConfig) -> Result<Arc<dyn ObjectStore>> {
    let url = Url::parse(&config.url)
        .map_err(|e| StoreError::Configuration(format!("invalid store url {}: {}", config.url, e)))?;

    match url.scheme() {
        "memory" => Ok(Arc::new(InMemory::new())),
        "file" => {
            let path = url.path();
            std::fs::create_dir_all(path).map_err(|e| {
                StoreError::Configuration(format!("cannot create store directory {}: {}", path, e))
            })?;
            let store = LocalFileSystem::new_with_prefix(path).map_err(|e| {
                StoreError::Configuration(format!("failed to build local store: {}", e))
            })?;
            Ok(Arc::new(store))
        }
        "s3" => {
            let bucket = url.host_str().unwrap_or_default();
            if bucket.is_empty() {
                return Err(StoreError::Configuration(format!(
                    "s3 url {} has no bucket",
                    config.url
                )));
            }

            let mut builder = AmazonS3Builder::new().with_bucket_name(bucket);
            if !config.region.is_empty() {
                builder = builder.with_region(&config.region);
            }
            if !config.access_key.is_empty() {
                builder = builder.with_access_key_id(&config.access_key);
            }
            if !config.secret_key.is_empty() {
                builder = builder.with_secret_access_key(&config.secret_key);
            }
            if !config.endpoint.is_empty() {
                builder = builder.with_endpoint(&config.endpoint);
            }

            let store = builder
                .build()
                .map_err(|e| StoreError::Configuration(format!("failed to build S3 store: {}", e)))?;

            let prefix = url.path().trim_matches('/');
            if prefix.is_empty() {
                Ok(Arc::new(store))
            } else {
                Ok(Arc::new(PrefixStore::new(store, prefix)))
            }
        }
        other => Err(StoreError::Configuration(format!(
            "unsupported store scheme {other:?} in {}",
            config.url
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_build_local_store_creates_directory() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("catalog");
        let config = StoreConfig::local(root.to_string_lossy());
        let _store = build_object_store(&config).unwrap();
        assert!(root.is_dir());
    }

    #[test]
    fn test_unknown_scheme_is_configuration_error() {
        let config = StoreConfig {
            url: "gopher://example".to_string(),
            ..StoreConfig::local("/unused")
        };
        assert!(matches!(
            build_object_store(&config),
            Err(StoreError::Configuration(_))
        ));
    }

    #[test]
    fn test_memory_store() {
        let config = StoreConfig {
            url: "memory://".to_string(),
            ..StoreConfig::local("/unused")
        };
        assert!(build_object_store(&config).is_ok());
    }
}
