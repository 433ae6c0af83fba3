//! Claims provider facade
//!
//! Validates identifiers, runs the aggregator, builds results, and records
//! metrics. Also handles claim record writes and removals.

use crate::aggregator::{Aggregation, ClaimAggregator, ResolveRequest};
use crate::config::ProviderConfig;
use crate::error::{ClaimsError, Result};
use crate::keys;
use crate::metrics::{MetricsCollector, Outcome, ProviderMetrics};
use crate::naming;
use crate::result::{
    ExpiryPolicy, LabeledVehicleUserInfo, ResolvedClaims, ResultBuilder, VehicleUserInfo, ALL_LABEL,
    AUTH_TOKEN_CLAIM, AUTH_TOKEN_LABEL,
};
use crate::source::ClaimSource;
use crate::store::ClaimStore;
use crate::types::{Claim, ClaimRecord, LabeledPaths, PathPattern};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Outcome of a claim resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Claims were resolved
    Resolved(ResolvedClaims),
    /// A user was given but has no association with the vehicle
    UnknownAssociation,
    /// The vehicle has no records
    UnknownVehicle,
}

impl Resolution {
    /// The resolved claims, if any
    pub fn into_resolved(self) -> Option<ResolvedClaims> {
        match self {
            Resolution::Resolved(claims) => Some(claims),
            _ => None,
        }
    }
}

/// Main entry point for claim resolution and claim record management
///
/// # Architecture
///
/// ```text
/// request → validate → ClaimAggregator → ClaimSource → ClaimStore
///                            ↓
///                      PathMatcher per label → ResultBuilder → Resolution
///                                                                  ↓
///                                                              [Metrics]
/// ```
pub struct ClaimsProvider {
    aggregator: ClaimAggregator,
    store: Arc<dyn ClaimStore>,
    metrics: Option<Arc<MetricsCollector>>,
    config: ProviderConfig,
}

impl ClaimsProvider {
    /// Create a provider over a claim store
    pub fn new(config: ProviderConfig, store: Arc<dyn ClaimStore>) -> Self {
        let metrics = if config.enable_metrics {
            Some(Arc::new(MetricsCollector::new()))
        } else {
            None
        };

        let source = ClaimSource::new(Arc::clone(&store), metrics.clone());

        info!("ClaimsProvider initialized with metrics={}", config.enable_metrics);

        Self {
            aggregator: ClaimAggregator::new(source),
            store,
            metrics,
            config,
        }
    }

    /// Provider configuration
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Resolves the claims for a request, with the one-month expiry.
    ///
    /// Fails only on invalid identifiers. Unknown vehicles and associations are
    /// normal outcomes.
    pub async fn resolve(&self, request: &ResolveRequest) -> Result<Resolution> {
        self.resolve_with(request, ExpiryPolicy::OneMonth).await
    }

    /// Direct lookup with a single `ALL` label.
    ///
    /// When a token is supplied it is echoed back as an `authToken` claim.
    /// Returns `None` for unknown vehicles and associations.
    pub async fn retrieve_vehicle_user_info(
        &self,
        vehicle_id: &str,
        user_id: Option<&str>,
        auth_token: Option<&str>,
        paths: Vec<PathPattern>,
    ) -> Result<Option<VehicleUserInfo>> {
        let token = auth_token.filter(|t| !t.is_empty());
        let request = Self::direct_request(vehicle_id, user_id, token, paths);

        let resolution = self.resolve_with(&request, ExpiryPolicy::OneMonth).await?;
        Ok(resolution
            .into_resolved()
            .map(|resolved| Self::echo_token(resolved, token))
            .map(VehicleUserInfo::from))
    }

    /// Re-resolves claims for an existing principal.
    ///
    /// An `authToken` pair among `prior_claims` is reused as the auth token.
    pub async fn refresh_claims_info(
        &self,
        vehicle_id: &str,
        user_id: Option<&str>,
        prior_claims: &[(String, String)],
        paths: Vec<PathPattern>,
    ) -> Result<Option<VehicleUserInfo>> {
        let token = prior_claims
            .iter()
            .find(|(name, _)| name == AUTH_TOKEN_CLAIM)
            .map(|(_, value)| value.as_str());

        debug!(vehicle_id, carried_token = token.is_some(), "Refreshing claims info");

        let request = Self::direct_request(vehicle_id, user_id, token, paths);

        let resolution = self.resolve_with(&request, ExpiryPolicy::OneMonth).await?;
        Ok(resolution
            .into_resolved()
            .map(|resolved| Self::echo_token(resolved, token))
            .map(VehicleUserInfo::from))
    }

    /// Vehicle-only lookup with caller-chosen labels and the seven-day expiry.
    ///
    /// An empty label map resolves the single default `ALL` label. A supplied
    /// token is echoed as an `authToken` claim inside every label.
    pub async fn retrieve_labeled_claims(
        &self,
        vehicle_id: &str,
        auth_token: Option<&str>,
        labeled_paths: LabeledPaths,
    ) -> Result<Option<LabeledVehicleUserInfo>> {
        let token = auth_token.filter(|t| !t.is_empty());
        let mut request = ResolveRequest::new(vehicle_id, labeled_paths);
        if let Some(token) = token {
            request = request.with_auth_token(token);
        }

        let resolution = self.resolve_with(&request, ExpiryPolicy::SevenDays).await?;
        Ok(resolution
            .into_resolved()
            .map(|resolved| Self::echo_token_per_label(resolved, token))
            .map(LabeledVehicleUserInfo::from))
    }

    /// Writes a claim record, replacing any existing one with the same identity.
    ///
    /// Blank ids are treated as absent; at least one id is required.
    pub async fn create_claims(
        &self,
        vehicle_id: Option<&str>,
        user_id: Option<&str>,
        service_id: Option<&str>,
        claims: Vec<Claim>,
    ) -> Result<ClaimRecord> {
        let (v, u, s) = self.normalize_identity(vehicle_id, user_id, service_id).await?;

        let record = ClaimRecord::new(v, u, s, claims);
        self.store.upsert(record.clone()).await?;

        if let Some(metrics) = &self.metrics {
            metrics.record_write().await;
        }

        info!(
            partition_key = %record.partition_key,
            id = %record.id,
            claims = record.claims.len(),
            "Claims record written"
        );

        Ok(record)
    }

    /// Deletes the claim record for an identity
    pub async fn remove_claims(
        &self,
        vehicle_id: Option<&str>,
        user_id: Option<&str>,
        service_id: Option<&str>,
    ) -> Result<()> {
        let (v, u, s) = self.normalize_identity(vehicle_id, user_id, service_id).await?;

        let partition_key = keys::partition_key(v.as_deref(), u.as_deref(), s.as_deref());
        let document_key = keys::document_key(v.as_deref(), u.as_deref(), s.as_deref());

        if !self.store.delete(&partition_key, &document_key).await? {
            return Err(ClaimsError::RecordNotFound(document_key));
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_removal().await;
        }

        info!(partition_key = %partition_key, id = %document_key, "Claims record removed");

        Ok(())
    }

    /// Get provider metrics
    pub async fn get_metrics(&self) -> Option<ProviderMetrics> {
        if let Some(metrics) = &self.metrics {
            Some(metrics.get_metrics().await)
        } else {
            None
        }
    }

    /// Export metrics in Prometheus text format
    pub async fn export_metrics(&self) -> Option<String> {
        if let Some(metrics) = &self.metrics {
            Some(metrics.export_prometheus().await)
        } else {
            None
        }
    }

    // Private helper methods

    async fn resolve_with(&self, request: &ResolveRequest, expiry: ExpiryPolicy) -> Result<Resolution> {
        let start = Instant::now();

        if let Err(e) = Self::validate(request) {
            if let Some(metrics) = &self.metrics {
                metrics.record_invalid_request().await;
            }
            return Err(e);
        }

        let defaulted;
        let request = if request.labeled_paths.is_empty() {
            defaulted = ResolveRequest {
                labeled_paths: Self::all_label(Vec::new()),
                ..request.clone()
            };
            &defaulted
        } else {
            request
        };

        debug!(
            vehicle_id = %request.vehicle_id,
            user_id = request.user().unwrap_or_default(),
            labels = request.labeled_paths.len(),
            "Resolving claims"
        );

        let (resolution, outcome) = match self.aggregator.aggregate(request).await {
            Aggregation::Claims(claims_by_label) => {
                let resolved =
                    ResultBuilder::new(expiry).build(&request.vehicle_id, request.user(), claims_by_label);
                (Resolution::Resolved(resolved), Outcome::Resolved)
            }
            Aggregation::UnknownAssociation => (Resolution::UnknownAssociation, Outcome::UnknownAssociation),
            Aggregation::UnknownVehicle => (Resolution::UnknownVehicle, Outcome::UnknownVehicle),
        };

        info!(
            vehicle_id = %request.vehicle_id,
            outcome = ?outcome,
            latency_us = start.elapsed().as_micros() as u64,
            "Claims resolution complete"
        );

        if let Some(metrics) = &self.metrics {
            metrics.record_outcome(outcome).await;
            metrics.record_latency(start.elapsed()).await;
        }

        Ok(resolution)
    }

    fn validate(request: &ResolveRequest) -> Result<()> {
        naming::require_valid("vehicleId", &request.vehicle_id)?;
        if let Some(user_id) = request.user() {
            naming::require_valid("userId", user_id)?;
        }
        Ok(())
    }

    async fn normalize_identity(
        &self,
        vehicle_id: Option<&str>,
        user_id: Option<&str>,
        service_id: Option<&str>,
    ) -> Result<(Option<String>, Option<String>, Option<String>)> {
        let normalized = Self::normalize(vehicle_id, user_id, service_id);

        if normalized.is_err() {
            if let Some(metrics) = &self.metrics {
                metrics.record_invalid_request().await;
            }
        }

        normalized
    }

    fn normalize(
        vehicle_id: Option<&str>,
        user_id: Option<&str>,
        service_id: Option<&str>,
    ) -> Result<(Option<String>, Option<String>, Option<String>)> {
        let v = naming::normalize_optional("vehicleId", vehicle_id)?;
        let u = naming::normalize_optional("userId", user_id)?;
        let s = naming::normalize_optional("serviceId", service_id)?;

        if v.is_none() && u.is_none() && s.is_none() {
            return Err(ClaimsError::InvalidRequest(
                "at least one of vehicleId, userId or serviceId is required".to_string(),
            ));
        }

        Ok((v, u, s))
    }

    fn all_label(paths: Vec<PathPattern>) -> LabeledPaths {
        let mut labeled = LabeledPaths::new();
        labeled.insert(ALL_LABEL.to_string(), paths);
        labeled
    }

    fn direct_request(
        vehicle_id: &str,
        user_id: Option<&str>,
        token: Option<&str>,
        paths: Vec<PathPattern>,
    ) -> ResolveRequest {
        ResolveRequest {
            vehicle_id: vehicle_id.to_string(),
            user_id: user_id.map(str::to_string),
            auth_token: token.map(str::to_string),
            labeled_paths: Self::all_label(paths),
        }
    }

    fn echo_token(mut resolved: ResolvedClaims, token: Option<&str>) -> ResolvedClaims {
        let Some(token) = token else {
            return resolved;
        };

        resolved
            .claims_by_label
            .entry(AUTH_TOKEN_LABEL.to_string())
            .or_default()
            .push(Claim::single(AUTH_TOKEN_CLAIM, token));
        resolved.flattened_claims = crate::result::flatten(&resolved.claims_by_label);
        resolved
    }

    fn echo_token_per_label(mut resolved: ResolvedClaims, token: Option<&str>) -> ResolvedClaims {
        let Some(token) = token else {
            return resolved;
        };

        for claims in resolved.claims_by_label.values_mut() {
            claims.push(Claim::single(AUTH_TOKEN_CLAIM, token));
        }
        resolved.flattened_claims = crate::result::flatten(&resolved.claims_by_label);
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryClaimStore;

    fn provider_with(store: InMemoryClaimStore) -> ClaimsProvider {
        ClaimsProvider::new(ProviderConfig::default(), Arc::new(store))
    }

    #[tokio::test]
    async fn test_invalid_vehicle_is_rejected_before_lookup() {
        let provider = provider_with(InMemoryClaimStore::new());

        let err = provider
            .retrieve_vehicle_user_info("bad id!", None, None, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimsError::InvalidIdentifier { field: "vehicleId", .. }));

        let metrics = provider.get_metrics().await.unwrap();
        assert_eq!(metrics.invalid_requests, 1);
        assert_eq!(metrics.total_requests, 0);
    }

    #[tokio::test]
    async fn test_token_is_echoed() {
        let provider = provider_with(InMemoryClaimStore::new());
        provider
            .create_claims(Some("v1"), None, None, vec![Claim::single("//mcvp/a", "1")])
            .await
            .unwrap();

        let info = provider
            .retrieve_vehicle_user_info("v1", None, Some("tok"), vec![])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(info.claims[AUTH_TOKEN_CLAIM], vec!["tok"]);
        assert_eq!(info.claims["//mcvp/a"], vec!["1"]);
    }

    #[tokio::test]
    async fn test_labeled_lookup_echoes_token_in_every_label() {
        let provider = provider_with(InMemoryClaimStore::new());
        provider
            .create_claims(Some("v1"), None, None, vec![Claim::single("//mcvp/a", "1")])
            .await
            .unwrap();

        let mut labels = LabeledPaths::new();
        labels.insert("L1".to_string(), vec![]);
        labels.insert("L2".to_string(), vec!["//mcvp/none".to_string()]);

        let info = provider
            .retrieve_labeled_claims("v1", Some("tok"), labels)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(info.labeled_claims.len(), 2);
        assert_eq!(info.labeled_claims["L1"]["//mcvp/a"], vec!["1"]);
        assert_eq!(info.labeled_claims["L1"][AUTH_TOKEN_CLAIM], vec!["tok"]);
        assert_eq!(info.labeled_claims["L2"][AUTH_TOKEN_CLAIM], vec!["tok"]);
        assert!(!info.labeled_claims.contains_key(AUTH_TOKEN_LABEL));
    }

    #[tokio::test]
    async fn test_labeled_lookup_without_token() {
        let provider = provider_with(InMemoryClaimStore::new());
        provider
            .create_claims(Some("v1"), None, None, vec![Claim::single("//mcvp/a", "1")])
            .await
            .unwrap();

        let info = provider
            .retrieve_labeled_claims("v1", Some(""), LabeledPaths::new())
            .await
            .unwrap()
            .unwrap();

        assert!(!info.labeled_claims[ALL_LABEL].contains_key(AUTH_TOKEN_CLAIM));
    }

    #[tokio::test]
    async fn test_token_does_not_create_association() {
        let provider = provider_with(InMemoryClaimStore::new());
        provider
            .create_claims(Some("v1"), None, None, vec![Claim::single("//mcvp/a", "1")])
            .await
            .unwrap();

        let request = ResolveRequest::new("v1", LabeledPaths::new())
            .with_user("u9")
            .with_auth_token("tok");
        assert_eq!(provider.resolve(&request).await.unwrap(), Resolution::UnknownAssociation);

        let info = provider
            .retrieve_vehicle_user_info("v1", Some("u9"), Some("tok"), vec![])
            .await
            .unwrap();
        assert!(info.is_none());
    }

    #[tokio::test]
    async fn test_refresh_reuses_prior_token() {
        let provider = provider_with(InMemoryClaimStore::new());
        provider.create_claims(Some("v1"), None, None, vec![]).await.unwrap();

        let prior = vec![
            ("sub".to_string(), "x".to_string()),
            (AUTH_TOKEN_CLAIM.to_string(), "carried".to_string()),
        ];
        let info = provider
            .refresh_claims_info("v1", None, &prior, vec![])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(info.claims[AUTH_TOKEN_CLAIM], vec!["carried"]);
    }

    #[tokio::test]
    async fn test_create_requires_an_identity() {
        let provider = provider_with(InMemoryClaimStore::new());

        let err = provider
            .create_claims(Some("  "), None, Some(""), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimsError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_remove_missing_record() {
        let provider = provider_with(InMemoryClaimStore::new());

        let err = provider.remove_claims(Some("v1"), None, None).await.unwrap_err();
        assert!(matches!(err, ClaimsError::RecordNotFound(ref id) if id == "Claim|v1||"));
    }

    #[tokio::test]
    async fn test_metrics_disabled() {
        let provider = ClaimsProvider::new(ProviderConfig::without_metrics(), Arc::new(InMemoryClaimStore::new()));
        assert!(provider.get_metrics().await.is_none());
        assert!(provider.export_metrics().await.is_none());
    }
}
