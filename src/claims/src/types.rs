//! Core claim types

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Caller-chosen label grouping filtered claims in a response
pub type Label = String;

/// Path pattern used to select claims by name (e.g. `//mcvp/*`)
pub type PathPattern = String;

/// Ordered `label → path patterns` request map
pub type LabeledPaths = IndexMap<Label, Vec<PathPattern>>;

/// Ordered `label → claims` map produced by filtering and merging
pub type LabeledClaims = IndexMap<Label, Vec<Claim>>;

/// Flattened `claim name → values` map
pub type FlattenedClaims = IndexMap<String, Vec<String>>;

/// A named, multi-valued attribute about a vehicle/user pair.
///
/// Two claims are equal when their names match case-insensitively and their
/// values match exactly, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "WireClaim", into = "WireClaim")]
pub struct Claim {
    /// Hierarchical claim name (e.g. `//mcvp/topic/sensor`, `Services:TypeA`)
    pub name: String,

    /// Claim values in stored order
    pub values: Vec<String>,
}

impl Claim {
    /// Create a claim with several values
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a single-valued claim
    pub fn single(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }

    fn folded_name(&self) -> impl Iterator<Item = char> + '_ {
        self.name.chars().flat_map(char::to_lowercase)
    }
}

impl PartialEq for Claim {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values && self.folded_name().eq(other.folded_name())
    }
}

impl Eq for Claim {}

impl Hash for Claim {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in self.folded_name() {
            c.hash(state);
        }
        self.values.hash(state);
    }
}

/// Single claim value as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimValue {
    /// The value of the claim
    pub value: String,
}

/// Wire shape of a claim: `{"name": ..., "values": [{"value": ...}]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireClaim {
    name: String,
    #[serde(default)]
    values: Option<Vec<WireValue>>,
}

/// A value on the wire; bare strings are accepted on input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum WireValue {
    Object(ClaimValue),
    Bare(String),
}

impl From<WireValue> for String {
    fn from(value: WireValue) -> Self {
        match value {
            WireValue::Object(v) => v.value,
            WireValue::Bare(v) => v,
        }
    }
}

impl From<WireClaim> for Claim {
    fn from(wire: WireClaim) -> Self {
        Self {
            name: wire.name,
            values: wire
                .values
                .unwrap_or_default()
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl From<Claim> for WireClaim {
    fn from(claim: Claim) -> Self {
        Self {
            name: claim.name,
            values: Some(
                claim
                    .values
                    .into_iter()
                    .map(|value| WireValue::Object(ClaimValue { value }))
                    .collect(),
            ),
        }
    }
}

/// Unit of storage: the claims attached to one vehicle/user/entity identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRecord {
    /// Document key within the partition
    pub id: String,

    /// Partition the record lives in
    pub partition_key: String,

    /// Vehicle the record applies to
    #[serde(default)]
    pub vehicle_id: Option<String>,

    /// User the record applies to
    #[serde(default)]
    pub user_id: Option<String>,

    /// Linked entity (service) whose claims are pulled in on lookup
    #[serde(default)]
    pub entity_id: Option<String>,

    /// Claims carried directly by this record
    #[serde(default, deserialize_with = "deserialize_claims")]
    pub claims: Vec<Claim>,
}

fn deserialize_claims<'de, D>(deserializer: D) -> std::result::Result<Vec<Claim>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Claim>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ClaimRecord {
    /// Build a record, deriving its document and partition keys from the identity parts
    pub fn new(
        vehicle_id: Option<String>,
        user_id: Option<String>,
        entity_id: Option<String>,
        claims: Vec<Claim>,
    ) -> Self {
        let v = vehicle_id.as_deref();
        let u = user_id.as_deref();
        let e = entity_id.as_deref();

        Self {
            id: crate::keys::document_key(v, u, e),
            partition_key: crate::keys::partition_key(v, u, e),
            vehicle_id,
            user_id,
            entity_id,
            claims,
        }
    }
}
