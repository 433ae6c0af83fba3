//! Provider configuration

/// Claims provider configuration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enable_metrics: true,
        }
    }
}

impl ProviderConfig {
    /// Configuration with metrics disabled
    pub fn without_metrics() -> Self {
        Self {
            enable_metrics: false,
        }
    }
}
