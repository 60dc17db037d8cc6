// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Asset catalog synchronization
//!
//! Live resource listings are reconciled into one Parquet record set per
//! asset type, kept in a blob store behind a [`blobstore::QueuedStore`].
//! A directory object maps asset types to their storage keys.
//!
//! - [`codec`]: typed records to and from Parquet
//! - [`records`]: the closed set of asset record types
//! - [`reconcile`]: upsert-by-identity with staleness marking
//! - [`directory`]: the asset type directory
//! - [`sync`]: collection cycles over a [`ResourceSource`]
//! - [`flows`]: matching flows against known AI endpoints

pub mod codec;
pub mod config;
pub mod directory;
mod error;
pub mod flows;
pub mod reconcile;
pub mod records;
pub mod source;
pub mod sync;

pub use codec::{ForArrow, MISSING_SENTINEL, decode, encode};
pub use config::{CatalogConfig, create_example_config, load_config, validate_config};
pub use directory::{AssetDirectory, DIRECTORY_KEY, DirectoryEntry};
pub use error::CatalogError;
pub use flows::{EndpointRegistry, FlowRecord, correlate, parse_flow_lines};
pub use reconcile::{Reconciled, reconcile};
pub use records::{
    AiFlowMatch, Asset, AssetKind, ComputeInstance, IamRole, LambdaFunction, NetworkInterface,
    Record, SecurityGroup, StorageBucket, Vpc,
};
pub use source::{ResourceSource, SnapshotSource, StaticSource};
pub use sync::{CatalogSync, CycleReport, RunSummary};

pub type Result<T> = std::result::Result<T, CatalogError>;
