//! # CVP Claims
//!
//! Claim resolution for connected-vehicle authorization.
//!
//! Given a vehicle, an optional user and a set of caller-labeled path
//! patterns, the provider gathers claims from every contribution source
//! (user+vehicle, user-only, vehicle-only, linked entities), filters them per
//! label, and decides whether the vehicle and the user/vehicle association
//! exist at all.
//!
//! ## Features
//!
//! - **Partitioned storage** behind the [`ClaimStore`] trait, with in-memory
//!   and PostgreSQL (`postgres` feature) backends
//! - **Path filtering** with prefix wildcards and namespace bridging
//! - **Label bucketing** of claims in caller order
//! - **Metrics** with Prometheus text export
//!
//! ## Example
//!
//! ```rust
//! use cvp_claims::{Claim, ClaimsProvider, InMemoryClaimStore, ProviderConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), cvp_claims::ClaimsError> {
//! let provider = ClaimsProvider::new(ProviderConfig::default(), Arc::new(InMemoryClaimStore::new()));
//!
//! provider
//!     .create_claims(Some("vehicle-1"), None, None, vec![Claim::single("//mcvp/topic/a", "read")])
//!     .await?;
//!
//! let info = provider
//!     .retrieve_vehicle_user_info("vehicle-1", None, None, vec![])
//!     .await?
//!     .expect("vehicle exists");
//!
//! assert_eq!(info.claims["//mcvp/topic/a"], vec!["read"]);
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod config;
pub mod error;
pub mod keys;
pub mod metrics;
pub mod naming;
pub mod path;
pub mod provider;
pub mod result;
pub mod source;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use aggregator::{Aggregation, ClaimAggregator, ResolveRequest};
pub use config::ProviderConfig;
pub use error::{ClaimsError, Result};
pub use metrics::{MetricsCollector, ProviderMetrics};
pub use path::PathMatcher;
pub use provider::{ClaimsProvider, Resolution};
pub use result::{LabeledVehicleUserInfo, ResolvedClaims, ResultBuilder, VehicleUserInfo};
pub use source::{ClaimSource, Lookup};
pub use store::{ClaimStore, InMemoryClaimStore};
#[cfg(feature = "postgres")]
pub use store::PostgresClaimStore;
pub use types::{Claim, ClaimRecord, ClaimValue, FlattenedClaims, Label, LabeledClaims, LabeledPaths};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
