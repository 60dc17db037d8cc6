// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Whole-object blob storage with per-key write serialization
//!
//! # Architecture
//!
//! - **ObjectGateway**: `get`/`put` of whole objects by key over an
//!   `object_store` backend, staged through local disk, with timeouts and
//!   retry with backoff
//! - **WriteQueue**: per-key FIFO of writes; reads wait for writes submitted
//!   before them
//! - **QueuedStore**: the gateway behind the queue, including a single-slot
//!   read-modify-write
//!
//! # Usage
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use blobstore::{GatewayOptions, ObjectGateway, QueuedStore, StagingArea, StoreConfig, WriteQueue};
//! use std::sync::Arc;
//!
//! let store = blobstore::build_object_store(&StoreConfig::local("/var/lib/assetcat"))?;
//! let gateway = ObjectGateway::for_store(
//!     store,
//!     StagingArea::new("/tmp/assetcat-staging")?,
//!     GatewayOptions::default(),
//! );
//! let catalog = QueuedStore::new(Arc::new(gateway), WriteQueue::new());
//!
//! catalog.store("Assets/AssetDirectory.parquet", bytes::Bytes::from_static(b"...")).await?;
//! let current = catalog.load("Assets/AssetDirectory.parquet").await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod gateway;
mod queue;
mod queued;
mod staging;

pub use config::{StoreConfig, build_object_store};
pub use error::StoreError;
pub use gateway::{BlobBackend, GatewayOptions, ObjectGateway, parse_key};
pub use queue::WriteQueue;
pub use queued::{PendingWrite, QueuedStore};
pub use staging::{Direction, StagedObject, StagingArea, staging_prefix};

/// Result type for blob store operations
pub type Result<T> = std::result::Result<T, StoreError>;
