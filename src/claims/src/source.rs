//! Claim retrieval per identity tuple
//!
//! [`ClaimSource`] turns store records into raw claim lists. It expands one
//! level of entity-linked claims and keeps "no record" distinct from "record
//! with no claims". Store failures never escape a lookup: they are logged,
//! counted, and reported as [`Lookup::NotFound`].

use crate::error::Result;
use crate::keys;
use crate::metrics::MetricsCollector;
use crate::store::ClaimStore;
use crate::types::{Claim, LabeledClaims, LabeledPaths};
use futures::TryStreamExt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of an identity-tuple lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// At least one record exists; the list may be empty
    Found(Vec<Claim>),
    /// No record exists, or the store could not be read
    NotFound,
}

impl Lookup {
    /// Returns whether the lookup found a record
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

/// Reads claims for identity tuples from a [`ClaimStore`]
#[derive(Clone)]
pub struct ClaimSource {
    store: Arc<dyn ClaimStore>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl ClaimSource {
    /// Create a source over `store`, optionally counting store failures
    pub fn new(store: Arc<dyn ClaimStore>, metrics: Option<Arc<MetricsCollector>>) -> Self {
        Self { store, metrics }
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<dyn ClaimStore> {
        &self.store
    }

    /// Looks up the claims stored for `(vehicle_id, user_id)`.
    ///
    /// Either part may be absent. For every record in the partition, the
    /// linked entity's claims (if any) come first, followed by the record's
    /// own claims.
    pub async fn lookup_by_identity(&self, vehicle_id: Option<&str>, user_id: Option<&str>) -> Lookup {
        let partition = keys::vehicle_user_partition(vehicle_id, user_id);

        match self.collect_partition(&partition).await {
            Ok(Some(claims)) => {
                debug!(partition = %partition, claims = claims.len(), "Partition lookup found records");
                Lookup::Found(claims)
            }
            Ok(None) => {
                debug!(partition = %partition, "Partition lookup found no records");
                Lookup::NotFound
            }
            Err(e) => {
                warn!(
                    vehicle_id = vehicle_id.unwrap_or_default(),
                    user_id = user_id.unwrap_or_default(),
                    error = %e,
                    "Error retrieving claims, treating as not found"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_store_failure().await;
                }
                Lookup::NotFound
            }
        }
    }

    /// Point read of a standalone entity record's claims
    pub async fn lookup_by_entity(&self, entity_id: &str) -> Result<Option<Vec<Claim>>> {
        let record = self
            .store
            .get(&keys::entity_partition(entity_id), &keys::entity_document_key(entity_id))
            .await?;

        Ok(record.map(|r| r.claims))
    }

    /// Claims granted by a supplied auth token.
    ///
    /// Tokens are not verified, so no claims are granted.
    pub async fn lookup_by_auth_token(&self, token: &str, _labeled_paths: &LabeledPaths) -> LabeledClaims {
        debug!(token_len = token.len(), "Auth token supplied; no token claims are granted");
        LabeledClaims::new()
    }

    async fn collect_partition(&self, partition: &str) -> Result<Option<Vec<Claim>>> {
        let mut records = self.store.scan_partition(partition);
        let mut claims: Option<Vec<Claim>> = None;

        while let Some(record) = records.try_next().await? {
            let collected = claims.get_or_insert_with(Vec::new);

            if let Some(entity_id) = record.entity_id.as_deref().filter(|e| !e.is_empty()) {
                if let Some(entity_claims) = self.lookup_by_entity(entity_id).await? {
                    collected.extend(entity_claims);
                }
            }

            collected.extend(record.claims);
        }

        Ok(claims)
    }
}
