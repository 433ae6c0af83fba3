//! Claim store integration tests
//!
//! Covers record writes and removals through the provider, and the handling
//! of store failures during resolution.

use async_trait::async_trait;
use cvp_claims::{
    Claim, ClaimRecord, ClaimStore, ClaimsError, ClaimsProvider, InMemoryClaimStore, LabeledPaths,
    ProviderConfig, Resolution, ResolveRequest,
};
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn all() -> LabeledPaths {
    let mut labels = LabeledPaths::new();
    labels.insert("ALL".to_string(), vec![]);
    labels
}

/// Store whose reads always fail
#[derive(Default)]
struct FailingStore {
    reads: AtomicUsize,
}

#[async_trait]
impl ClaimStore for FailingStore {
    fn scan_partition<'a>(&'a self, _partition_key: &'a str) -> BoxStream<'a, cvp_claims::Result<ClaimRecord>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        stream::iter(vec![Err(ClaimsError::Store("connection reset".to_string()))]).boxed()
    }

    async fn get(&self, _partition_key: &str, _document_key: &str) -> cvp_claims::Result<Option<ClaimRecord>> {
        Err(ClaimsError::Store("connection reset".to_string()))
    }

    async fn upsert(&self, _record: ClaimRecord) -> cvp_claims::Result<()> {
        Err(ClaimsError::Store("read only".to_string()))
    }

    async fn delete(&self, _partition_key: &str, _document_key: &str) -> cvp_claims::Result<bool> {
        Err(ClaimsError::Store("read only".to_string()))
    }
}

/// Store whose entity point reads fail while partition scans succeed
struct BrokenEntityStore {
    inner: InMemoryClaimStore,
}

#[async_trait]
impl ClaimStore for BrokenEntityStore {
    fn scan_partition<'a>(&'a self, partition_key: &'a str) -> BoxStream<'a, cvp_claims::Result<ClaimRecord>> {
        self.inner.scan_partition(partition_key)
    }

    async fn get(&self, _partition_key: &str, _document_key: &str) -> cvp_claims::Result<Option<ClaimRecord>> {
        Err(ClaimsError::Store("timeout".to_string()))
    }

    async fn upsert(&self, record: ClaimRecord) -> cvp_claims::Result<()> {
        self.inner.upsert(record).await
    }

    async fn delete(&self, partition_key: &str, document_key: &str) -> cvp_claims::Result<bool> {
        self.inner.delete(partition_key, document_key).await
    }
}

// ============================================================================
// STORE FAILURES
// ============================================================================

#[tokio::test]
async fn test_store_failure_reads_as_unknown_vehicle() {
    let store = Arc::new(FailingStore::default());
    let provider = ClaimsProvider::new(ProviderConfig::default(), store.clone());

    let resolution = provider.resolve(&ResolveRequest::new("v1", all())).await.unwrap();

    assert_eq!(resolution, Resolution::UnknownVehicle);
    assert_eq!(store.reads.load(Ordering::SeqCst), 1);

    let metrics = provider.get_metrics().await.unwrap();
    assert_eq!(metrics.store_failures, 1);
    assert_eq!(metrics.unknown_vehicle, 1);
}

#[tokio::test]
async fn test_store_failure_on_pair_lookup_reads_as_unknown_association() {
    let provider = ClaimsProvider::new(ProviderConfig::default(), Arc::new(FailingStore::default()));

    let resolution = provider
        .resolve(&ResolveRequest::new("v1", all()).with_user("u1"))
        .await
        .unwrap();

    assert_eq!(resolution, Resolution::UnknownAssociation);
}

#[tokio::test]
async fn test_entity_read_failure_fails_whole_partition_lookup() {
    let inner = InMemoryClaimStore::with_records([ClaimRecord::new(
        Some("v1".to_string()),
        None,
        Some("svc".to_string()),
        vec![Claim::single("//mcvp/own", "1")],
    )])
    .await;
    let provider = ClaimsProvider::new(ProviderConfig::default(), Arc::new(BrokenEntityStore { inner }));

    let resolution = provider.resolve(&ResolveRequest::new("v1", all())).await.unwrap();
    assert_eq!(resolution, Resolution::UnknownVehicle);
}

#[tokio::test]
async fn test_write_failures_propagate() {
    let provider = ClaimsProvider::new(ProviderConfig::default(), Arc::new(FailingStore::default()));

    let err = provider
        .create_claims(Some("v1"), None, None, vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, ClaimsError::Store(_)));

    let err = provider.remove_claims(Some("v1"), None, None).await.unwrap_err();
    assert!(matches!(err, ClaimsError::Store(_)));
}

// ============================================================================
// CREATE / REMOVE
// ============================================================================

#[tokio::test]
async fn test_create_then_resolve_then_remove() {
    let store = Arc::new(InMemoryClaimStore::new());
    let provider = ClaimsProvider::new(ProviderConfig::default(), store.clone());

    let record = provider
        .create_claims(Some("v1"), Some(" "), None, vec![Claim::single("//mcvp/a", "1")])
        .await
        .unwrap();
    assert_eq!(record.id, "Claim|v1||");
    assert_eq!(record.partition_key, "ClaimP|v1|");
    assert!(record.user_id.is_none());

    let resolution = provider.resolve(&ResolveRequest::new("v1", all())).await.unwrap();
    assert!(matches!(resolution, Resolution::Resolved(_)));

    provider.remove_claims(Some("v1"), None, None).await.unwrap();
    assert!(store.is_empty().await);

    let resolution = provider.resolve(&ResolveRequest::new("v1", all())).await.unwrap();
    assert_eq!(resolution, Resolution::UnknownVehicle);

    let metrics = provider.get_metrics().await.unwrap();
    assert_eq!(metrics.records_written, 1);
    assert_eq!(metrics.records_removed, 1);
}

#[tokio::test]
async fn test_service_record_lands_in_entity_partition() {
    let store = Arc::new(InMemoryClaimStore::new());
    let provider = ClaimsProvider::new(ProviderConfig::default(), store.clone());

    let record = provider
        .create_claims(None, None, Some("svc-a"), vec![Claim::single("Services:TypeA", "on")])
        .await
        .unwrap();

    assert_eq!(record.partition_key, "ClaimP|svc-a");
    assert_eq!(record.id, "Claim|||svc-a");
    assert!(store.get("ClaimP|svc-a", "Claim|||svc-a").await.unwrap().is_some());
}

#[tokio::test]
async fn test_create_rejects_illegal_identifier() {
    let provider = ClaimsProvider::new(ProviderConfig::default(), Arc::new(InMemoryClaimStore::new()));

    let err = provider
        .create_claims(Some("v|1"), None, None, vec![])
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "vehicleId [v|1] contains illegal characters");
}

#[tokio::test]
async fn test_create_replaces_existing_record() {
    let store = Arc::new(InMemoryClaimStore::new());
    let provider = ClaimsProvider::new(ProviderConfig::default(), store.clone());

    provider
        .create_claims(Some("v1"), Some("u1"), None, vec![Claim::single("old", "1")])
        .await
        .unwrap();
    provider
        .create_claims(Some("v1"), Some("u1"), None, vec![Claim::single("new", "2")])
        .await
        .unwrap();

    assert_eq!(store.len().await, 1);
    let record = store.get("ClaimP|v1|u1", "Claim|v1|u1|").await.unwrap().unwrap();
    assert_eq!(record.claims, vec![Claim::single("new", "2")]);
}

#[test]
fn test_blocking_resolution() {
    let provider = ClaimsProvider::new(ProviderConfig::default(), Arc::new(InMemoryClaimStore::new()));

    let resolution = tokio_test::block_on(provider.resolve(&ResolveRequest::new("v1", all()))).unwrap();
    assert_eq!(resolution, Resolution::UnknownVehicle);
}
