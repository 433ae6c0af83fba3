//! Metrics collection for claim resolution observability

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Resolution outcome recorded by [`MetricsCollector::record_outcome`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Claims were resolved for the identity
    Resolved,
    /// The vehicle has no records at all
    UnknownVehicle,
    /// The user has no linkage to the vehicle
    UnknownAssociation,
}

/// Provider metrics snapshot
#[derive(Debug, Clone, Default)]
pub struct ProviderMetrics {
    /// Total number of resolution requests
    pub total_requests: u64,

    /// Requests answered with claims
    pub resolved: u64,

    /// Requests rejected as unknown vehicle
    pub unknown_vehicle: u64,

    /// Requests rejected as unknown user/vehicle association
    pub unknown_association: u64,

    /// Requests rejected before lookup (invalid identifiers)
    pub invalid_requests: u64,

    /// Store failures swallowed during lookups
    pub store_failures: u64,

    /// Records written through create
    pub records_written: u64,

    /// Records deleted through remove
    pub records_removed: u64,

    /// Latency percentiles
    pub latency_p50_ms: f64,
    pub latency_p90_ms: f64,
    pub latency_p99_ms: f64,

    /// Average latency
    pub avg_latency_ms: f64,
}

impl ProviderMetrics {
    /// Fraction of requests answered with claims
    pub fn resolve_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.resolved as f64 / self.total_requests as f64
        }
    }
}

/// Metrics collector with Prometheus-compatible export
pub struct MetricsCollector {
    /// Metrics data
    metrics: Arc<RwLock<ProviderMetrics>>,

    /// Latency samples for percentile calculation
    latency_samples: Arc<RwLock<Vec<f64>>>,

    /// Maximum samples to keep
    max_samples: usize,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(ProviderMetrics::default())),
            latency_samples: Arc::new(RwLock::new(Vec::with_capacity(10_000))),
            max_samples: 10_000,
        }
    }

    /// Record a resolution outcome
    pub async fn record_outcome(&self, outcome: Outcome) {
        let mut metrics = self.metrics.write().await;
        metrics.total_requests += 1;

        match outcome {
            Outcome::Resolved => metrics.resolved += 1,
            Outcome::UnknownVehicle => metrics.unknown_vehicle += 1,
            Outcome::UnknownAssociation => metrics.unknown_association += 1,
        }
    }

    /// Record a request rejected by identifier validation
    pub async fn record_invalid_request(&self) {
        self.metrics.write().await.invalid_requests += 1;
    }

    /// Record a store failure that was reported as not-found
    pub async fn record_store_failure(&self) {
        self.metrics.write().await.store_failures += 1;
    }

    /// Record a record write
    pub async fn record_write(&self) {
        self.metrics.write().await.records_written += 1;
    }

    /// Record a record removal
    pub async fn record_removal(&self) {
        self.metrics.write().await.records_removed += 1;
    }

    /// Record request latency
    pub async fn record_latency(&self, latency: Duration) {
        let latency_ms = latency.as_secs_f64() * 1000.0;

        let mut samples = self.latency_samples.write().await;
        samples.push(latency_ms);

        // Keep only recent samples
        if samples.len() > self.max_samples {
            samples.drain(0..1_000);
        }

        let mut metrics = self.metrics.write().await;

        let sum: f64 = samples.iter().sum();
        metrics.avg_latency_ms = sum / samples.len() as f64;

        let mut sorted = samples.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));

        metrics.latency_p50_ms = Self::percentile(&sorted, 0.50);
        metrics.latency_p90_ms = Self::percentile(&sorted, 0.90);
        metrics.latency_p99_ms = Self::percentile(&sorted, 0.99);
    }

    /// Get current metrics snapshot
    pub async fn get_metrics(&self) -> ProviderMetrics {
        self.metrics.read().await.clone()
    }

    /// Reset all metrics
    pub async fn reset(&self) {
        *self.metrics.write().await = ProviderMetrics::default();
        self.latency_samples.write().await.clear();
    }

    /// Export metrics in Prometheus format
    pub async fn export_prometheus(&self) -> String {
        let metrics = self.metrics.read().await;

        format!(
            r#"# HELP claims_requests_total Total number of claim resolution requests
# TYPE claims_requests_total counter
claims_requests_total {}

# HELP claims_resolved_total Requests answered with claims
# TYPE claims_resolved_total counter
claims_resolved_total {}

# HELP claims_unknown_vehicle_total Requests for vehicles with no records
# TYPE claims_unknown_vehicle_total counter
claims_unknown_vehicle_total {}

# HELP claims_unknown_association_total Requests for unlinked user/vehicle pairs
# TYPE claims_unknown_association_total counter
claims_unknown_association_total {}

# HELP claims_invalid_requests_total Requests rejected by identifier validation
# TYPE claims_invalid_requests_total counter
claims_invalid_requests_total {}

# HELP claims_store_failures_total Store failures reported as not found
# TYPE claims_store_failures_total counter
claims_store_failures_total {}

# HELP claims_records_written_total Claim records written
# TYPE claims_records_written_total counter
claims_records_written_total {}

# HELP claims_records_removed_total Claim records removed
# TYPE claims_records_removed_total counter
claims_records_removed_total {}

# HELP claims_latency_seconds Resolution latency percentiles
# TYPE claims_latency_seconds summary
claims_latency_seconds{{quantile="0.5"}} {}
claims_latency_seconds{{quantile="0.9"}} {}
claims_latency_seconds{{quantile="0.99"}} {}
"#,
            metrics.total_requests,
            metrics.resolved,
            metrics.unknown_vehicle,
            metrics.unknown_association,
            metrics.invalid_requests,
            metrics.store_failures,
            metrics.records_written,
            metrics.records_removed,
            metrics.latency_p50_ms / 1000.0,
            metrics.latency_p90_ms / 1000.0,
            metrics.latency_p99_ms / 1000.0,
        )
    }

    fn percentile(sorted: &[f64], p: f64) -> f64 {
        if sorted.is_empty() {
            return 0.0;
        }

        let idx = ((sorted.len() as f64) * p) as usize;
        sorted[idx.min(sorted.len() - 1)]
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
