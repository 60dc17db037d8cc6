// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use blobstore::{BlobBackend, GatewayOptions, ObjectGateway, QueuedStore, StagingArea, WriteQueue};
use bytes::Bytes;
use catalog::{
    AiFlowMatch, AssetKind, CatalogError, CatalogSync, ComputeInstance, DIRECTORY_KEY,
    EndpointRegistry, ResourceSource, StaticSource, Vpc, correlate, parse_flow_lines,
};
use object_store::ObjectStore;
use object_store::memory::InMemory;
use object_store::path::Path;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::{TempDir, tempdir};

/// In-memory backend whose next N reads fail
#[derive(Debug)]
struct FlakyReads {
    inner: Arc<dyn ObjectStore>,
    failing_reads: AtomicUsize,
}

#[async_trait]
impl BlobBackend for FlakyReads {
    async fn fetch(&self, location: &Path) -> object_store::Result<Bytes> {
        let failing = self
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(object_store::Error::Generic {
                store: "flaky",
                source: "connection reset".into(),
            });
        }
        self.inner.get(location).await?.bytes().await
    }

    async fn replace(&self, location: &Path, bytes: Bytes) -> object_store::Result<()> {
        self.inner.put(location, bytes.into()).await?;
        Ok(())
    }
}

/// Lists `vpc-old` after a delay on the first call, `vpc-new` at once after that
#[derive(Debug, Default)]
struct SlowFirstListing {
    calls: AtomicUsize,
}

#[async_trait]
impl ResourceSource for SlowFirstListing {
    async fn list(&self, _kind: AssetKind) -> catalog::Result<Vec<Value>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(200)).await;
            return Ok(vec![vpc("vpc-old")]);
        }
        Ok(vec![vpc("vpc-new")])
    }
}

struct Harness {
    _staging: TempDir,
    backend: Arc<FlakyReads>,
    source: Arc<StaticSource>,
    sync: CatalogSync,
}

fn harness() -> Harness {
    let staging = tempdir().unwrap();
    let backend = Arc::new(FlakyReads {
        inner: Arc::new(InMemory::new()),
        failing_reads: AtomicUsize::new(0),
    });
    let gateway = ObjectGateway::new(
        backend.clone(),
        StagingArea::new(staging.path()).unwrap(),
        GatewayOptions {
            operation_timeout: Duration::from_secs(5),
            max_attempts: 2,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        },
    );
    let store = QueuedStore::new(Arc::new(gateway), WriteQueue::new());
    let source = Arc::new(StaticSource::new());
    let sync = CatalogSync::new(store, source.clone());
    Harness {
        _staging: staging,
        backend,
        source,
        sync,
    }
}

fn instance(id: &str, state: &str) -> Value {
    json!({
        "InstanceId": id,
        "InstanceType": "g5.xlarge",
        "State": {"Name": state},
        "ImageId": "ami-1",
        "Tags": [{"Key": "Name", "Value": id}]
    })
}

fn vpc(id: &str) -> Value {
    json!({"VpcId": id, "CidrBlock": "10.0.0.0/16", "State": "available"})
}

fn states(records: &[ComputeInstance]) -> Vec<(&str, &str, bool)> {
    records
        .iter()
        .map(|r| (r.unique_id.as_str(), r.state.as_str(), r.is_stale))
        .collect()
}

#[tokio::test]
async fn test_cycle_updates_inserts_and_marks_stale() {
    let h = harness();

    h.source.set(AssetKind::ComputeInstance, vec![instance("i-1", "running")]);
    let first = h.sync.sync_one::<ComputeInstance>().await.unwrap();
    assert_eq!((first.fetched, first.inserted, first.total), (1, 1, 1));

    h.source.set(
        AssetKind::ComputeInstance,
        vec![instance("i-1", "stopped"), instance("i-2", "running")],
    );
    let second = h.sync.sync_one::<ComputeInstance>().await.unwrap();
    assert_eq!((second.inserted, second.updated, second.stale), (1, 1, 0));
    let records = h.sync.load::<ComputeInstance>().await.unwrap();
    assert_eq!(
        states(&records),
        vec![("i-1", "stopped", false), ("i-2", "running", false)]
    );

    h.source.set(AssetKind::ComputeInstance, vec![instance("i-2", "running")]);
    let third = h.sync.sync_one::<ComputeInstance>().await.unwrap();
    assert_eq!(third.stale, 1);
    let records = h.sync.load::<ComputeInstance>().await.unwrap();
    assert_eq!(
        states(&records),
        vec![("i-1", "stopped", true), ("i-2", "running", false)]
    );

    // An empty listing keeps every record, now stale
    h.source.set(AssetKind::ComputeInstance, Vec::new());
    let fourth = h.sync.sync_one::<ComputeInstance>().await.unwrap();
    assert_eq!((fourth.total, fourth.stale), (2, 2));
}

#[tokio::test]
async fn test_repeated_cycle_is_idempotent() {
    let h = harness();
    h.source.set(
        AssetKind::ComputeInstance,
        vec![instance("i-1", "running"), instance("i-2", "running")],
    );

    let _ = h.sync.sync_one::<ComputeInstance>().await.unwrap();
    let once = h.sync.load::<ComputeInstance>().await.unwrap();
    let again = h.sync.sync_one::<ComputeInstance>().await.unwrap();
    let twice = h.sync.load::<ComputeInstance>().await.unwrap();

    assert_eq!(once, twice);
    assert_eq!((again.inserted, again.updated, again.stale), (0, 2, 0));
}

#[tokio::test]
async fn test_bad_items_are_skipped_not_fatal() {
    let h = harness();
    h.source.set(
        AssetKind::ComputeInstance,
        vec![
            instance("i-1", "running"),
            json!({"InstanceId": "i-2"}),
            json!({"InstanceId": "i-3", "InstanceType": "t3", "State": {"Name": "running"}, "LaunchTime": "soon"}),
            instance("i-4", "running"),
        ],
    );

    let report = h.sync.sync_one::<ComputeInstance>().await.unwrap();
    assert_eq!((report.fetched, report.skipped, report.total), (4, 2, 2));
}

#[tokio::test]
async fn test_failing_kind_does_not_abort_others() {
    let h = harness();
    h.source.set(AssetKind::Vpc, vec![vpc("vpc-1")]);
    h.source.fail(AssetKind::IamRole, "AccessDenied");

    let summary = h
        .sync
        .sync_all(&[AssetKind::Vpc, AssetKind::IamRole, AssetKind::StorageBucket])
        .await;

    assert!(!summary.is_success());
    assert_eq!(summary.reports.len(), 2);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].0, AssetKind::IamRole);
    assert!(matches!(summary.failures[0].1, CatalogError::Source { .. }));
    assert_eq!(h.sync.load::<Vpc>().await.unwrap().len(), 1);

    let entries = h.sync.directory().entries().await.unwrap();
    let mut types: Vec<&str> = entries.iter().map(|e| e.asset_type.as_str()).collect();
    types.sort_unstable();
    assert_eq!(types, vec!["StorageBucket", "Vpc"]);
}

#[tokio::test]
async fn test_directory_is_upserted_once_per_type() {
    let h = harness();
    h.source.set(AssetKind::Vpc, vec![vpc("vpc-1")]);

    for _ in 0..3 {
        let _ = h.sync.sync_one::<Vpc>().await.unwrap();
    }
    let entries = h.sync.directory().entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].asset_table, "Assets/Vpcinventory.parquet");
    assert_eq!(
        h.sync.directory().lookup("Vpc").await.unwrap().as_deref(),
        Some("Assets/Vpcinventory.parquet")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cycles_of_one_type_lose_nothing() {
    let h = harness();

    let cycles = (0..8).map(|i| {
        let sync = h.sync.clone();
        tokio::spawn(async move {
            let observed: Vec<ComputeInstance> = vec![ComputeInstance {
                unique_id: format!("i-{i}"),
                is_stale: false,
                instance_type: "t3.micro".to_string(),
                state: "running".to_string(),
                private_ip_address: None,
                public_ip_address: None,
                vpc_id: None,
                subnet_id: None,
                image_id: "ami-1".to_string(),
                launch_time: None,
                security_groups: Vec::new(),
                tags: None,
                iam_instance_profile: None,
                is_ai_workload: None,
                ai_score: None,
            }];
            sync.sync_observed(observed).await
        })
    });
    for cycle in futures::future::join_all(cycles).await {
        let _ = cycle.unwrap().unwrap();
    }

    let records = h.sync.load::<ComputeInstance>().await.unwrap();
    assert_eq!(records.len(), 8, "every cycle's record must survive");
    assert_eq!(
        records.iter().filter(|r| !r.is_stale).count(),
        1,
        "only the last cycle's record is fresh"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cycles_of_one_type_run_in_start_order() {
    let h = harness();
    let sync = CatalogSync::new(h.sync.store().clone(), Arc::new(SlowFirstListing::default()));

    let earlier = {
        let sync = sync.clone();
        tokio::spawn(async move { sync.sync_one::<Vpc>().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let later = sync.sync_one::<Vpc>().await.unwrap();
    let earlier = earlier.await.unwrap().unwrap();

    assert_eq!((earlier.inserted, earlier.total), (1, 1));
    assert_eq!((later.inserted, later.stale, later.total), (1, 1, 2));

    let records = sync.load::<Vpc>().await.unwrap();
    let ids: Vec<(&str, bool)> = records
        .iter()
        .map(|r| (r.unique_id.as_str(), r.is_stale))
        .collect();
    assert_eq!(ids, vec![("vpc-old", true), ("vpc-new", false)]);
}

#[tokio::test]
async fn test_unreadable_record_set_is_not_treated_as_empty() {
    let h = harness();
    h.source.set(AssetKind::ComputeInstance, vec![instance("i-1", "running")]);
    let _ = h.sync.sync_one::<ComputeInstance>().await.unwrap();

    // Every attempt to read the existing set fails
    h.backend.failing_reads.store(2, Ordering::SeqCst);
    h.source.set(AssetKind::ComputeInstance, vec![instance("i-2", "running")]);
    let err = h.sync.sync_one::<ComputeInstance>().await.unwrap_err();
    assert!(matches!(err, CatalogError::Store(_)));

    // The stored set is untouched: i-1 is still there and still fresh
    let records = h.sync.load::<ComputeInstance>().await.unwrap();
    assert_eq!(states(&records), vec![("i-1", "running", false)]);

    // A single transient failure is retried and the cycle succeeds
    h.backend.failing_reads.store(1, Ordering::SeqCst);
    let report = h.sync.sync_one::<ComputeInstance>().await.unwrap();
    assert_eq!((report.inserted, report.stale, report.total), (1, 1, 2));
}

#[tokio::test]
async fn test_flow_matches_persist_as_asset_type() {
    let h = harness();
    let mut endpoints = BTreeMap::new();
    let _ = endpoints.insert("openai".to_string(), vec!["104.18.6.192".to_string()]);
    let registry = EndpointRegistry::from_config(&endpoints).unwrap();

    let (flows, skipped) = parse_flow_lines(concat!(
        r#"{"SourceAddress":"10.0.0.5","SourcePort":40000,"DestinationAddress":"104.18.6.192","DestinationPort":443,"Protocol":"tcp","Bytes":512,"Start":1700000000}"#,
        "\n",
        r#"{"SourceAddress":"10.0.0.5","SourcePort":40001,"DestinationAddress":"1.1.1.1","DestinationPort":53,"Protocol":"udp","Bytes":64,"Start":1700000001}"#,
    ));
    assert_eq!((flows.len(), skipped), (2, 0));

    let matches = correlate(&flows, &registry);
    let report = h.sync.sync_observed(matches).await.unwrap();
    assert_eq!(report.total, 1);

    let stored = h.sync.load::<AiFlowMatch>().await.unwrap();
    assert_eq!(stored[0].service, "openai");
    assert_eq!(stored[0].bytes, 512);

    let shown = h.sync.load_json(AssetKind::AiFlowMatch, false).await.unwrap();
    assert_eq!(shown[0]["Service"], "openai");
    assert!(h.sync.load_json(AssetKind::AiFlowMatch, true).await.unwrap().is_empty());
    assert!(h.sync.store().load(DIRECTORY_KEY).await.unwrap().is_some());
}
