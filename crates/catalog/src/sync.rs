// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Collection cycles
//!
//! A cycle for one asset type lists live resources, projects them into
//! records, and then, as a single queued read-modify-write of the type's
//! storage object, decodes the previous record set, reconciles and writes
//! the merged set back. Finally the directory entry is upserted.
//!
//! Cycles for different asset types run concurrently and fail
//! independently. Cycles for the same asset type never overlap: each holds a
//! per-type slot from listing to directory upsert, and slots are granted in
//! the order cycles were started.

use crate::codec;
use crate::directory::AssetDirectory;
use crate::reconcile::reconcile;
use crate::records::{
    AiFlowMatch, Asset, AssetKind, ComputeInstance, IamRole, LambdaFunction, NetworkInterface,
    SecurityGroup, StorageBucket, Vpc,
};
use crate::source::ResourceSource;
use crate::{CatalogError, Result};
use blobstore::{QueuedStore, WriteQueue};
use diagnostics::*;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Outcome of one asset type's cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub asset_type: &'static str,
    pub storage_key: String,
    /// Descriptions returned by the listing
    pub fetched: usize,
    /// Descriptions that could not be projected
    pub skipped: usize,
    pub inserted: usize,
    pub updated: usize,
    pub stale: usize,
    /// Records in the persisted set
    pub total: usize,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: fetched {}, skipped {}, new {}, updated {}, stale {}, total {}",
            self.asset_type,
            self.fetched,
            self.skipped,
            self.inserted,
            self.updated,
            self.stale,
            self.total
        )
    }
}

/// Outcome of a multi-type run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<CycleReport>,
    pub failures: Vec<(AssetKind, CatalogError)>,
}

impl RunSummary {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct CatalogSync {
    store: QueuedStore,
    directory: AssetDirectory,
    source: Arc<dyn ResourceSource>,
    /// One slot per asset type, held for a whole cycle
    cycles: WriteQueue,
}

impl CatalogSync {
    pub fn new(store: QueuedStore, source: Arc<dyn ResourceSource>) -> Self {
        Self {
            directory: AssetDirectory::new(store.clone()),
            store,
            source,
            cycles: WriteQueue::new(),
        }
    }

    #[must_use]
    pub fn directory(&self) -> &AssetDirectory {
        &self.directory
    }

    #[must_use]
    pub fn store(&self) -> &QueuedStore {
        &self.store
    }

    /// Run one cycle for asset type `A`
    ///
    /// The whole cycle, listing included, holds `A`'s cycle slot. A cycle
    /// started later never lists before an earlier one has written.
    pub async fn sync_one<A: Asset>(&self) -> Result<CycleReport> {
        self.cycles
            .write(A::ASSET_TYPE, || async { self.run_cycle::<A>().await })
            .await
    }

    async fn run_cycle<A: Asset>(&self) -> Result<CycleReport> {
        let asset_type = A::ASSET_TYPE;
        info!("starting {asset_type} cycle", asset_type: asset_type);

        let listing = self.source.list(A::KIND).await?;
        let fetched = listing.len();
        let (observed, skipped) = project::<A>(listing);

        let mut report = self.merge_observed(observed).await?;
        report.fetched = fetched;
        report.skipped = skipped;

        let (inserted, updated, stale, total) =
            (report.inserted, report.updated, report.stale, report.total);
        info!(
            "finished {asset_type} cycle: fetched {fetched}, skipped {skipped}, new {inserted}, updated {updated}, stale {stale}, total {total}",
            asset_type: asset_type,
            fetched: fetched,
            skipped: skipped,
            inserted: inserted,
            updated: updated,
            stale: stale,
            total: total
        );
        Ok(report)
    }

    /// Reconcile already-projected records into `A`'s record set
    ///
    /// Takes `A`'s cycle slot like [`sync_one`](Self::sync_one). `fetched`
    /// and `skipped` in the report count `observed` only.
    pub async fn sync_observed<A: Asset>(&self, observed: Vec<A>) -> Result<CycleReport> {
        self.cycles
            .write(A::ASSET_TYPE, || async { self.merge_observed(observed).await })
            .await
    }

    async fn merge_observed<A: Asset>(&self, observed: Vec<A>) -> Result<CycleReport> {
        let key = A::storage_key();
        let fetched = observed.len();

        let report = self
            .store
            .update(&key, |current| {
                let existing: Vec<A> = codec::decode_optional(current)?;
                let merged = reconcile(existing, observed);
                let report = CycleReport {
                    asset_type: A::ASSET_TYPE,
                    storage_key: key.clone(),
                    fetched,
                    skipped: 0,
                    inserted: merged.inserted,
                    updated: merged.updated,
                    stale: merged.stale,
                    total: merged.records.len(),
                };
                Ok::<_, CatalogError>((codec::encode(&merged.records)?, report))
            })
            .await?;

        let _ = self.directory.upsert(A::ASSET_TYPE, &key).await?;
        Ok(report)
    }

    /// Run one cycle for `kind`
    pub async fn sync_kind(&self, kind: AssetKind) -> Result<CycleReport> {
        match kind {
            AssetKind::ComputeInstance => self.sync_one::<ComputeInstance>().await,
            AssetKind::NetworkInterface => self.sync_one::<NetworkInterface>().await,
            AssetKind::SecurityGroup => self.sync_one::<SecurityGroup>().await,
            AssetKind::Vpc => self.sync_one::<Vpc>().await,
            AssetKind::IamRole => self.sync_one::<IamRole>().await,
            AssetKind::LambdaFunction => self.sync_one::<LambdaFunction>().await,
            AssetKind::StorageBucket => self.sync_one::<StorageBucket>().await,
            AssetKind::AiFlowMatch => self.sync_one::<AiFlowMatch>().await,
        }
    }

    /// Run cycles for all `kinds` concurrently
    ///
    /// A failing kind is logged and reported; it never stops the others.
    pub async fn sync_all(&self, kinds: &[AssetKind]) -> RunSummary {
        let cycles = kinds
            .iter()
            .map(|&kind| async move { (kind, self.sync_kind(kind).await) });
        let results = futures::future::join_all(cycles).await;

        let mut summary = RunSummary::default();
        for (kind, result) in results {
            match result {
                Ok(report) => summary.reports.push(report),
                Err(e) => {
                    let asset_type = kind.as_str();
                    let failure = e.to_string();
                    error!(
                        "{asset_type} cycle failed: {failure}",
                        asset_type: asset_type,
                        failure: failure
                    );
                    summary.failures.push((kind, e));
                }
            }
        }
        summary
    }

    /// Current record set of asset type `A`
    pub async fn load<A: Asset>(&self) -> Result<Vec<A>> {
        codec::decode_optional(self.store.load(&A::storage_key()).await?)
    }

    /// Current record set of `kind` as JSON objects
    pub async fn load_json(&self, kind: AssetKind, stale_only: bool) -> Result<Vec<Value>> {
        match kind {
            AssetKind::ComputeInstance => self.load_values::<ComputeInstance>(stale_only).await,
            AssetKind::NetworkInterface => self.load_values::<NetworkInterface>(stale_only).await,
            AssetKind::SecurityGroup => self.load_values::<SecurityGroup>(stale_only).await,
            AssetKind::Vpc => self.load_values::<Vpc>(stale_only).await,
            AssetKind::IamRole => self.load_values::<IamRole>(stale_only).await,
            AssetKind::LambdaFunction => self.load_values::<LambdaFunction>(stale_only).await,
            AssetKind::StorageBucket => self.load_values::<StorageBucket>(stale_only).await,
            AssetKind::AiFlowMatch => self.load_values::<AiFlowMatch>(stale_only).await,
        }
    }

    async fn load_values<A: Asset>(&self, stale_only: bool) -> Result<Vec<Value>> {
        self.load::<A>()
            .await?
            .into_iter()
            .filter(|record| !stale_only || record.is_stale())
            .map(|record| serde_json::to_value(record).map_err(CatalogError::from))
            .collect()
    }
}

/// Project provider descriptions into records, skipping the ones that fail
fn project<A: Asset>(listing: Vec<Value>) -> (Vec<A>, usize) {
    let asset_type = A::ASSET_TYPE;
    let mut records = Vec::with_capacity(listing.len());
    let mut skipped = 0;

    for (position, item) in listing.into_iter().enumerate() {
        let projected = serde_json::from_value::<A::Description>(item)
            .map_err(CatalogError::from)
            .and_then(A::from_provider);
        match projected {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                let failure = e.to_string();
                warn!(
                    "skipping {asset_type} item {position}: {failure}",
                    asset_type: asset_type,
                    position: position,
                    failure: failure
                );
            }
        }
    }
    (records, skipped)
}
