// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Gateway access routed through the write queue

use crate::gateway::ObjectGateway;
use crate::queue::WriteQueue;
use crate::{Result, StoreError};
use bytes::Bytes;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A write submitted with [`QueuedStore::submit_store`]
///
/// Dropping it does not cancel the write.
#[derive(Debug)]
pub struct PendingWrite {
    key: String,
    handle: JoinHandle<Result<()>>,
}

impl PendingWrite {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Wait for the write's own outcome
    pub async fn finish(self) -> Result<()> {
        self.handle
            .await
            .map_err(|_| StoreError::WriteAborted { key: self.key })?
    }
}

/// The only path catalog code uses to reach the blob store
///
/// Reads wait out writes submitted before them, writes to a key run one at a
/// time, and [`update`](Self::update) holds the key's write slot across a
/// whole read-modify-write.
#[derive(Debug, Clone)]
pub struct QueuedStore {
    gateway: Arc<ObjectGateway>,
    queue: WriteQueue,
}

impl QueuedStore {
    pub fn new(gateway: Arc<ObjectGateway>, queue: WriteQueue) -> Self {
        Self { gateway, queue }
    }

    #[must_use]
    pub fn gateway(&self) -> &Arc<ObjectGateway> {
        &self.gateway
    }

    #[must_use]
    pub fn queue(&self) -> &WriteQueue {
        &self.queue
    }

    /// Current bytes at `key`, or `None` if the key does not exist
    pub async fn load(&self, key: &str) -> Result<Option<Bytes>> {
        let gateway = self.gateway.clone();
        let owned = key.to_string();
        self.queue
            .read(key, move || async move { gateway.get_optional(&owned).await })
            .await
    }

    /// Replace the object at `key`
    pub async fn store(&self, key: &str, bytes: Bytes) -> Result<()> {
        let gateway = self.gateway.clone();
        let owned = key.to_string();
        self.queue
            .write(key, move || async move { gateway.put(&owned, bytes).await })
            .await
    }

    /// Queue a replace of `key` and return without waiting for it
    ///
    /// Failures are logged by the queue; they reach the caller only through
    /// [`PendingWrite::finish`].
    pub fn submit_store(&self, key: &str, bytes: Bytes) -> PendingWrite {
        let gateway = self.gateway.clone();
        let owned = key.to_string();
        let handle = self
            .queue
            .submit_write(key, move || async move { gateway.put(&owned, bytes).await });
        PendingWrite {
            key: key.to_string(),
            handle,
        }
    }

    /// Read `key`, transform it with `f`, and write the result back, as one
    /// queued write
    ///
    /// `f` receives `None` when the key does not exist. If `f` fails nothing
    /// is written. Any error type that can hold a [`StoreError`] works, so
    /// callers can fail with their own decoding errors.
    pub async fn update<F, T, E>(&self, key: &str, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(Option<Bytes>) -> std::result::Result<(Bytes, T), E>,
        E: From<StoreError>,
    {
        let gateway = self.gateway.clone();
        let owned = key.to_string();
        self.queue
            .update(key, move || async move {
                let current = gateway.get_optional(&owned).await?;
                let (next, output) = f(current)?;
                gateway.put(&owned, next).await?;
                Ok::<T, E>(output)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayOptions;
    use crate::staging::StagingArea;
    use object_store::ObjectStore;
    use object_store::memory::InMemory;
    use tempfile::tempdir;

    fn queued(dir: &std::path::Path) -> QueuedStore {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let gateway = ObjectGateway::for_store(
            store,
            StagingArea::new(dir).unwrap(),
            GatewayOptions::default(),
        );
        QueuedStore::new(Arc::new(gateway), WriteQueue::new())
    }

    #[tokio::test]
    async fn test_load_of_absent_key_is_none() {
        let dir = tempdir().unwrap();
        let store = queued(dir.path());
        assert_eq!(store.load("Assets/AssetDirectory.parquet").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_updates_do_not_lose_changes() {
        let dir = tempdir().unwrap();
        let store = queued(dir.path());

        let updates = (0..16u8).map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .update("counter", move |current| {
                        let mut bytes = current.map(|b| b.to_vec()).unwrap_or_default();
                        bytes.push(i);
                        Ok::<_, StoreError>((Bytes::from(bytes), ()))
                    })
                    .await
            })
        });
        for handle in futures::future::join_all(updates).await {
            handle.unwrap().unwrap();
        }

        let stored = store.load("counter").await.unwrap().unwrap();
        let mut seen = stored.to_vec();
        seen.sort_unstable();
        assert_eq!(seen, (0..16u8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_submitted_store_is_visible_to_later_reads() {
        let dir = tempdir().unwrap();
        let store = queued(dir.path());

        let pending = store.submit_store("k", Bytes::from_static(b"background"));
        assert_eq!(pending.key(), "k");
        // Submitted after the write, so it waits for it
        assert_eq!(store.load("k").await.unwrap().unwrap().as_ref(), b"background");
        pending.finish().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_transform_writes_nothing() {
        let dir = tempdir().unwrap();
        let store = queued(dir.path());
        store.store("k", Bytes::from_static(b"original")).await.unwrap();

        let result = store
            .update("k", |_| {
                Err::<(Bytes, ()), _>(StoreError::Configuration("rejected".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(store.load("k").await.unwrap().unwrap().as_ref(), b"original");
    }
}
