//! In-memory claim store

use super::ClaimStore;
use crate::error::Result;
use crate::types::ClaimRecord;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type Partition = IndexMap<String, ClaimRecord>;

/// In-memory claim store implementation.
///
/// Records within a partition are scanned in insertion order.
#[derive(Clone, Default)]
pub struct InMemoryClaimStore {
    partitions: Arc<RwLock<HashMap<String, Partition>>>,
}

impl InMemoryClaimStore {
    /// Create a new in-memory claim store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records
    pub async fn with_records(records: impl IntoIterator<Item = ClaimRecord>) -> Self {
        let store = Self::new();
        {
            let mut partitions = store.partitions.write().await;
            for record in records {
                partitions
                    .entry(record.partition_key.clone())
                    .or_default()
                    .insert(record.id.clone(), record);
            }
        }
        store
    }

    /// Total number of records across all partitions
    pub async fn len(&self) -> usize {
        self.partitions.read().await.values().map(IndexMap::len).sum()
    }

    /// Returns whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ClaimStore for InMemoryClaimStore {
    fn scan_partition<'a>(&'a self, partition_key: &'a str) -> BoxStream<'a, Result<ClaimRecord>> {
        stream::once(async move {
            let partitions = self.partitions.read().await;
            let records: Vec<Result<ClaimRecord>> = partitions
                .get(partition_key)
                .map(|p| p.values().cloned().map(Ok).collect())
                .unwrap_or_default();
            stream::iter(records)
        })
        .flatten()
        .boxed()
    }

    async fn get(&self, partition_key: &str, document_key: &str) -> Result<Option<ClaimRecord>> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .get(partition_key)
            .and_then(|p| p.get(document_key))
            .cloned())
    }

    async fn upsert(&self, record: ClaimRecord) -> Result<()> {
        let mut partitions = self.partitions.write().await;
        partitions
            .entry(record.partition_key.clone())
            .or_default()
            .insert(record.id.clone(), record);
        Ok(())
    }

    async fn delete(&self, partition_key: &str, document_key: &str) -> Result<bool> {
        let mut partitions = self.partitions.write().await;
        let Some(partition) = partitions.get_mut(partition_key) else {
            return Ok(false);
        };

        let removed = partition.shift_remove(document_key).is_some();
        if partition.is_empty() {
            partitions.remove(partition_key);
        }
        Ok(removed)
    }
}
