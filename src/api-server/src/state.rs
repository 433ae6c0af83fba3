use cvp_claims::{ClaimsProvider, InMemoryClaimStore, ProviderConfig};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Claims provider
    pub provider: Arc<ClaimsProvider>,

    /// Server start time for uptime calculation
    pub start_time: Instant,

    /// Application version
    pub version: String,
}

impl AppState {
    pub fn new(provider: ClaimsProvider) -> Self {
        Self {
            provider: Arc::new(provider),
            start_time: Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for AppState {
    /// State backed by an empty in-memory store
    fn default() -> Self {
        Self::new(ClaimsProvider::new(
            ProviderConfig::default(),
            Arc::new(InMemoryClaimStore::new()),
        ))
    }
}
