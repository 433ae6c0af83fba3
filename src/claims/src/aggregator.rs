//! Per-request claim aggregation
//!
//! Combines the contribution sources for one `(vehicle, user)` request into a
//! single labeled claim map, deciding along the way whether the vehicle and
//! the user/vehicle association exist.
//!
//! ```text
//! auth token ─┐
//! (v, u) ─────┤  each filtered per label  ─→  concatenated per label
//! (-, u) ─────┤
//! (v, -) ─────┘
//! ```

use crate::path::PathMatcher;
use crate::source::{ClaimSource, Lookup};
use crate::types::{Claim, LabeledClaims, LabeledPaths};
use tracing::debug;

/// Inputs for a single resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    /// Vehicle to resolve claims for
    pub vehicle_id: String,

    /// Optional user paired with the vehicle
    pub user_id: Option<String>,

    /// Optional opaque token supplied by the caller
    pub auth_token: Option<String>,

    /// Requested `label → path patterns`
    pub labeled_paths: LabeledPaths,
}

impl ResolveRequest {
    /// Create a vehicle-only request with the given labels
    pub fn new(vehicle_id: impl Into<String>, labeled_paths: LabeledPaths) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            user_id: None,
            auth_token: None,
            labeled_paths,
        }
    }

    /// Set the user
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the auth token
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// The user id, with empty strings treated as absent
    pub fn user(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|u| !u.is_empty())
    }

    /// The auth token, with empty strings treated as absent
    pub fn token(&self) -> Option<&str> {
        self.auth_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Terminal outcome of aggregation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregation {
    /// Claims bucketed by label
    Claims(LabeledClaims),
    /// A user was given but nothing links them to the vehicle
    UnknownAssociation,
    /// The vehicle has no records
    UnknownVehicle,
}

/// Runs the aggregation state machine over a [`ClaimSource`]
#[derive(Clone)]
pub struct ClaimAggregator {
    source: ClaimSource,
    matcher: PathMatcher,
}

impl ClaimAggregator {
    /// Create an aggregator reading from `source`
    pub fn new(source: ClaimSource) -> Self {
        Self {
            source,
            matcher: PathMatcher::new(),
        }
    }

    /// Source the aggregator reads from
    pub fn source(&self) -> &ClaimSource {
        &self.source
    }

    /// Aggregates all contributions for `request`.
    ///
    /// Contributions are looked up in order: auth token, `(v, u)`, `(-, u)`,
    /// `(v, -)`. Each one is filtered on its own and appended label by label,
    /// so duplicates across contributions are kept.
    pub async fn aggregate(&self, request: &ResolveRequest) -> Aggregation {
        let vehicle_id = request.vehicle_id.as_str();
        let labeled_paths = &request.labeled_paths;

        let mut accumulated = LabeledClaims::new();
        let mut user_vehicle_present = false;

        if let Some(token) = request.token() {
            let token_claims = self.source.lookup_by_auth_token(token, labeled_paths).await;
            append_labeled(&mut accumulated, token_claims);
        }

        if let Some(user_id) = request.user() {
            match self.source.lookup_by_identity(Some(vehicle_id), Some(user_id)).await {
                Lookup::Found(claims) => {
                    user_vehicle_present = true;
                    self.merge(&mut accumulated, &claims, labeled_paths);
                }
                Lookup::NotFound if accumulated.is_empty() => {
                    debug!(vehicle_id, user_id, "No association between user and vehicle");
                    return Aggregation::UnknownAssociation;
                }
                Lookup::NotFound => {}
            }

            if let Lookup::Found(claims) = self.source.lookup_by_identity(None, Some(user_id)).await {
                self.merge(&mut accumulated, &claims, labeled_paths);
            }
        }

        match self.source.lookup_by_identity(Some(vehicle_id), None).await {
            Lookup::Found(claims) => self.merge(&mut accumulated, &claims, labeled_paths),
            Lookup::NotFound if !user_vehicle_present => {
                debug!(vehicle_id, "Vehicle has no records");
                return Aggregation::UnknownVehicle;
            }
            Lookup::NotFound => {}
        }

        Aggregation::Claims(accumulated)
    }

    fn merge(&self, accumulated: &mut LabeledClaims, claims: &[Claim], labeled_paths: &LabeledPaths) {
        append_labeled(accumulated, self.matcher.filter_to_lists(claims, labeled_paths));
    }
}

fn append_labeled(accumulated: &mut LabeledClaims, contribution: LabeledClaims) {
    for (label, claims) in contribution {
        accumulated.entry(label).or_default().extend(claims);
    }
}
