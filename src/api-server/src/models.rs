use chrono::{DateTime, Utc};
use cvp_claims::{Claim, FlattenedClaims, LabeledPaths, LabeledVehicleUserInfo, VehicleUserInfo};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Query parameters for direct claim lookups
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClaimsQuery {
    /// Comma-separated path patterns, e.g. `//mcvp/topic/*,//mcvp/other`
    pub paths: Option<String>,

    /// API version
    #[serde(rename = "api-version")]
    pub api_version: Option<String>,
}

impl ClaimsQuery {
    /// Path patterns from the comma-separated `paths` parameter
    pub fn path_list(&self) -> Vec<String> {
        self.paths
            .as_deref()
            .map(|paths| {
                paths
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Labeled lookup body: label to path patterns
///
/// A `null` pattern list is accepted and means the default pattern.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct LabeledPathsRequest(pub IndexMap<String, Option<Vec<String>>>);

impl LabeledPathsRequest {
    /// Label map with `null` pattern lists replaced by empty ones
    pub fn into_labeled_paths(self) -> LabeledPaths {
        self.0
            .into_iter()
            .map(|(label, paths)| (label, paths.unwrap_or_default()))
            .collect()
    }
}

/// Claim record write/removal request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimsStoreRequest {
    /// Vehicle identifier
    #[validate(length(max = 256))]
    pub vehicle_id: Option<String>,

    /// User identifier
    #[validate(length(max = 256))]
    pub user_id: Option<String>,

    /// Service (entity) identifier
    #[validate(length(max = 256))]
    pub service_id: Option<String>,

    /// Claims to store: `[{"name": ..., "values": [{"value": ...}]}]`
    #[serde(default)]
    #[schema(value_type = Option<Vec<Object>>)]
    pub claims: Option<Vec<Claim>>,
}

/// Result of a claim record write
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimsStoreResponse {
    /// Document key of the written record
    pub id: String,

    /// Partition the record was written to
    pub partition_key: String,
}

/// Direct lookup response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ClaimsResponse {
    /// Claim name to values
    #[schema(value_type = Object)]
    pub claims: FlattenedClaims,

    pub expiry_time: DateTime<Utc>,

    pub user_id: Option<String>,

    pub vehicle_id: String,
}

impl From<VehicleUserInfo> for ClaimsResponse {
    fn from(info: VehicleUserInfo) -> Self {
        Self {
            claims: info.claims,
            expiry_time: info.expiry_time,
            user_id: info.user_id,
            vehicle_id: info.vehicle_id,
        }
    }
}

/// Labeled lookup response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct LabeledClaimsResponse {
    /// Label to claim name to values
    #[schema(value_type = Object)]
    pub labeled_claims: IndexMap<String, FlattenedClaims>,

    pub expiry_time: DateTime<Utc>,

    pub user_id: Option<String>,

    pub vehicle_id: String,
}

impl From<LabeledVehicleUserInfo> for LabeledClaimsResponse {
    fn from(info: LabeledVehicleUserInfo) -> Self {
        Self {
            labeled_claims: info.labeled_claims,
            expiry_time: info.expiry_time,
            user_id: info.user_id,
            vehicle_id: info.vehicle_id,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Additional detail, when available
    pub detail: Option<String>,

    /// HTTP status code
    pub status: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_list_splits_and_trims() {
        let query = ClaimsQuery {
            paths: Some("//mcvp/a/*, //mcvp/b,,".to_string()),
            api_version: None,
        };
        assert_eq!(query.path_list(), vec!["//mcvp/a/*", "//mcvp/b"]);
        assert!(ClaimsQuery::default().path_list().is_empty());
    }

    #[test]
    fn test_labeled_paths_request_accepts_null_lists() {
        let req: LabeledPathsRequest =
            serde_json::from_str(r#"{"L": null, "M": ["//mcvp/a/*"], "N": []}"#).unwrap();

        let labels = req.into_labeled_paths();
        let order: Vec<&str> = labels.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["L", "M", "N"]);
        assert!(labels["L"].is_empty());
        assert_eq!(labels["M"], vec!["//mcvp/a/*"]);
        assert!(labels["N"].is_empty());
    }

    #[test]
    fn test_store_request_accepts_camel_case() {
        let req: ClaimsStoreRequest = serde_json::from_str(
            r#"{"vehicleId": "v1", "serviceId": "svc", "claims": [{"name": "n", "values": [{"value": "x"}]}]}"#,
        )
        .unwrap();

        assert_eq!(req.vehicle_id.as_deref(), Some("v1"));
        assert!(req.user_id.is_none());
        assert_eq!(req.claims.unwrap()[0].values, vec!["x"]);
    }

    #[test]
    fn test_store_request_validation() {
        let req = ClaimsStoreRequest {
            vehicle_id: Some("v".repeat(300)),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}
