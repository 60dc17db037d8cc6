// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Whole-object reads and writes against a remote blob store
//!
//! The gateway exposes a flat key space. A `put` replaces the whole object;
//! there is no append or partial write. Both directions go through the
//! [`StagingArea`] so the bytes handed back to callers are the bytes that
//! were synced to local disk. Each remote call runs under a timeout, and
//! retryable failures are retried with exponential backoff.

use crate::staging::{Direction, StagingArea};
use crate::{Result, StoreError};
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use bytes::Bytes;
use object_store::ObjectStore;
use object_store::path::Path;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

/// Minimal remote surface the gateway needs
///
/// Implemented for any `object_store::ObjectStore`. Tests wrap it to inject
/// failures and delays.
#[async_trait]
pub trait BlobBackend: Debug + Send + Sync {
    async fn fetch(&self, location: &Path) -> object_store::Result<Bytes>;

    async fn replace(&self, location: &Path, bytes: Bytes) -> object_store::Result<()>;
}

#[async_trait]
impl BlobBackend for Arc<dyn ObjectStore> {
    async fn fetch(&self, location: &Path) -> object_store::Result<Bytes> {
        self.get(location).await?.bytes().await
    }

    async fn replace(&self, location: &Path, bytes: Bytes) -> object_store::Result<()> {
        self.put(location, bytes.into()).await?;
        Ok(())
    }
}

/// Retry and timeout settings for remote calls
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Limit for a single remote call
    pub operation_timeout: Duration,
    /// Total attempts per operation, including the first
    pub max_attempts: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            operation_timeout: Duration::from_secs(30),
            max_attempts: 4,
            min_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        }
    }
}

#[derive(Debug)]
pub struct ObjectGateway {
    backend: Arc<dyn BlobBackend>,
    staging: StagingArea,
    options: GatewayOptions,
}

impl ObjectGateway {
    pub fn new(backend: Arc<dyn BlobBackend>, staging: StagingArea, options: GatewayOptions) -> Self {
        Self {
            backend,
            staging,
            options,
        }
    }

    /// Gateway over an `object_store` implementation
    pub fn for_store(
        store: Arc<dyn ObjectStore>,
        staging: StagingArea,
        options: GatewayOptions,
    ) -> Self {
        Self::new(Arc::new(store), staging, options)
    }

    #[must_use]
    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }

    /// Read the whole object at `key`
    ///
    /// Returns [`StoreError::NotFound`] when the key does not exist.
    pub async fn get(&self, key: &str) -> Result<Bytes> {
        let location = parse_key(key)?;

        let downloaded = (|| async { self.fetch_once(key, &location).await })
            .retry(self.backoff())
            .when(StoreError::is_retryable)
            .notify(|e, delay| log_retry("get", key, e, delay))
            .await?;

        let staged = self
            .staging
            .stage(key, Direction::Download, &downloaded)
            .await?;
        Ok(staged.into_bytes())
    }

    /// Like [`get`](Self::get), but an absent key is `Ok(None)`
    pub async fn get_optional(&self, key: &str) -> Result<Option<Bytes>> {
        match self.get(key).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.is_not_found() => {
                diagnostics::debug!("no object at {key}", key: key);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the whole object at `key` with `bytes`
    ///
    /// The write is durable once this returns; a `get` issued afterwards
    /// observes exactly these bytes.
    pub async fn put(&self, key: &str, bytes: Bytes) -> Result<()> {
        let location = parse_key(key)?;
        let staged = self.staging.stage(key, Direction::Upload, &bytes).await?;
        let payload = staged.bytes().clone();

        (|| async { self.replace_once(key, &location, payload.clone()).await })
            .retry(self.backoff())
            .when(StoreError::is_retryable)
            .notify(|e, delay| log_retry("put", key, e, delay))
            .await?;

        let size = payload.len();
        diagnostics::debug!("wrote {size} bytes to {key}", size: size, key: key);
        Ok(())
    }

    async fn fetch_once(&self, key: &str, location: &Path) -> Result<Bytes> {
        let limit = self.options.operation_timeout;
        match tokio::time::timeout(limit, self.backend.fetch(location)).await {
            Ok(result) => result.map_err(|e| StoreError::from_object_store(key, e)),
            Err(_) => Err(StoreError::Timeout {
                op: "get",
                key: key.to_string(),
                limit,
            }),
        }
    }

    async fn replace_once(&self, key: &str, location: &Path, bytes: Bytes) -> Result<()> {
        let limit = self.options.operation_timeout;
        match tokio::time::timeout(limit, self.backend.replace(location, bytes)).await {
            Ok(result) => result.map_err(|e| StoreError::from_object_store(key, e)),
            Err(_) => Err(StoreError::Timeout {
                op: "put",
                key: key.to_string(),
                limit,
            }),
        }
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.options.min_delay)
            .with_max_delay(self.options.max_delay)
            .with_max_times(self.options.max_attempts.saturating_sub(1))
            .with_jitter()
    }
}

fn log_retry(op: &str, key: &str, e: &StoreError, delay: Duration) {
    let failure = e.to_string();
    let delay_ms = delay.as_millis() as u64;
    diagnostics::warn!(
        "retrying {op} of {key} in {delay_ms}ms after: {failure}",
        op: op,
        key: key,
        delay_ms: delay_ms,
        failure: failure
    );
}

/// Validate a storage key and convert it to an object store path
pub fn parse_key(key: &str) -> Result<Path> {
    let invalid = |reason: &str| StoreError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    if key.is_empty() {
        return Err(invalid("empty key"));
    }
    if key.starts_with('/') {
        return Err(invalid("leading slash"));
    }
    if key.split('/').any(|part| part == "..") {
        return Err(invalid("parent directory segment"));
    }
    Path::parse(key).map_err(|e| invalid(&e.to_string()))
}
