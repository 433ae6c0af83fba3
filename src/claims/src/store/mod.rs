//! Claim document storage
//!
//! The resolution core reads records through [`ClaimStore`], a partitioned
//! document store supporting point reads and partition-scoped scans.

use crate::error::Result;
use crate::types::ClaimRecord;
use async_trait::async_trait;
use futures::stream::BoxStream;

mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::InMemoryClaimStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresClaimStore;

/// Partitioned claim document store
#[async_trait]
pub trait ClaimStore: Send + Sync {
    /// Stream every record stored under a partition
    fn scan_partition<'a>(&'a self, partition_key: &'a str) -> BoxStream<'a, Result<ClaimRecord>>;

    /// Point read of a single record
    async fn get(&self, partition_key: &str, document_key: &str) -> Result<Option<ClaimRecord>>;

    /// Insert or replace a record
    async fn upsert(&self, record: ClaimRecord) -> Result<()>;

    /// Delete a record, returning whether it existed
    async fn delete(&self, partition_key: &str, document_key: &str) -> Result<bool>;
}
