//! Flattening and expiry of resolved claims

use crate::types::{FlattenedClaims, Label, LabeledClaims};
use chrono::{DateTime, Duration, Months, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Label used for direct lookups
pub const ALL_LABEL: &str = "ALL";

/// Label carrying the echoed auth token
pub const AUTH_TOKEN_LABEL: &str = "AuthTokenLabel";

/// Claim name carrying the echoed auth token
pub const AUTH_TOKEN_CLAIM: &str = "authToken";

/// Days a labeled lookup stays valid
pub const LABELED_EXPIRY_DAYS: i64 = 7;

/// Lifetime granted to a resolution result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryPolicy {
    /// One calendar month, used by direct lookups
    OneMonth,
    /// Seven days, used by labeled lookups
    SevenDays,
}

impl ExpiryPolicy {
    /// Expiry instant for a result resolved at `now`
    pub fn expiry_from(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            ExpiryPolicy::OneMonth => now
                .checked_add_months(Months::new(1))
                .unwrap_or_else(|| now + Duration::days(30)),
            ExpiryPolicy::SevenDays => now + Duration::days(LABELED_EXPIRY_DAYS),
        }
    }
}

/// Result of a successful resolution, built per request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedClaims {
    /// Vehicle the claims were resolved for
    pub vehicle_id: String,
    /// User the claims were resolved for, if any
    pub user_id: Option<String>,
    /// Instant after which the result must be resolved again
    pub expiry_time: DateTime<Utc>,
    /// Claims bucketed by label, in request order
    pub claims_by_label: LabeledClaims,
    /// All labels merged into `name → values`
    pub flattened_claims: FlattenedClaims,
}

/// Direct lookup result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VehicleUserInfo {
    /// Claim name to values
    pub claims: FlattenedClaims,
    /// Instant after which the result must be resolved again
    pub expiry_time: DateTime<Utc>,
    /// User the claims were resolved for, if any
    pub user_id: Option<String>,
    /// Vehicle the claims were resolved for
    pub vehicle_id: String,
}

impl From<ResolvedClaims> for VehicleUserInfo {
    fn from(resolved: ResolvedClaims) -> Self {
        Self {
            claims: resolved.flattened_claims,
            expiry_time: resolved.expiry_time,
            user_id: resolved.user_id,
            vehicle_id: resolved.vehicle_id,
        }
    }
}

/// Labeled lookup result: each label flattened on its own
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LabeledVehicleUserInfo {
    /// Label to claim name to values, in request order
    pub labeled_claims: IndexMap<Label, FlattenedClaims>,
    /// Instant after which the result must be resolved again
    pub expiry_time: DateTime<Utc>,
    /// Always `None`; labeled lookups are vehicle-only
    pub user_id: Option<String>,
    /// Vehicle the claims were resolved for
    pub vehicle_id: String,
}

impl From<ResolvedClaims> for LabeledVehicleUserInfo {
    fn from(resolved: ResolvedClaims) -> Self {
        Self {
            labeled_claims: flatten_by_label(&resolved.claims_by_label),
            expiry_time: resolved.expiry_time,
            user_id: resolved.user_id,
            vehicle_id: resolved.vehicle_id,
        }
    }
}

/// Builds [`ResolvedClaims`] from aggregated labeled claims
#[derive(Debug, Clone, Copy)]
pub struct ResultBuilder {
    expiry: ExpiryPolicy,
}

impl ResultBuilder {
    /// Create a builder stamping results with `expiry`
    pub fn new(expiry: ExpiryPolicy) -> Self {
        Self { expiry }
    }

    /// Build a result resolved now
    pub fn build(&self, vehicle_id: &str, user_id: Option<&str>, claims_by_label: LabeledClaims) -> ResolvedClaims {
        self.build_at(Utc::now(), vehicle_id, user_id, claims_by_label)
    }

    /// Build a result resolved at `now`
    pub fn build_at(
        &self,
        now: DateTime<Utc>,
        vehicle_id: &str,
        user_id: Option<&str>,
        claims_by_label: LabeledClaims,
    ) -> ResolvedClaims {
        ResolvedClaims {
            vehicle_id: vehicle_id.to_string(),
            user_id: user_id.map(str::to_string),
            expiry_time: self.expiry.expiry_from(now),
            flattened_claims: flatten(&claims_by_label),
            claims_by_label,
        }
    }
}

/// Merges every label's claims into one `name → values` map.
///
/// Names are compared case-insensitively and keep their first-seen spelling.
/// Values of repeated names are unioned in first-seen order.
pub fn flatten(claims_by_label: &LabeledClaims) -> FlattenedClaims {
    let mut flattened = FlattenedClaims::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for claim in claims_by_label.values().flatten() {
        let folded: String = claim.name.chars().flat_map(char::to_lowercase).collect();

        let idx = *positions.entry(folded).or_insert_with(|| {
            flattened.insert(claim.name.clone(), Vec::new());
            flattened.len() - 1
        });

        if let Some((_, values)) = flattened.get_index_mut(idx) {
            for value in &claim.values {
                if !values.contains(value) {
                    values.push(value.clone());
                }
            }
        }
    }

    flattened
}

/// Flattens each label's claims separately
pub fn flatten_by_label(claims_by_label: &LabeledClaims) -> IndexMap<Label, FlattenedClaims> {
    claims_by_label
        .iter()
        .map(|(label, claims)| {
            let mut single = LabeledClaims::new();
            single.insert(label.clone(), claims.clone());
            (label.clone(), flatten(&single))
        })
        .collect()
}
