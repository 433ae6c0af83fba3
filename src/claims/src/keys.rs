//! Storage key derivation
//!
//! Maps identity tuples to the partition and document keys used by the
//! document store. The same functions are used to write records and to read
//! them back, so their output must stay stable.
//!
//! - Vehicle/user partitions: `ClaimP|{vehicleId}|{userId}`
//! - Entity partitions: `ClaimP|{entityId}`
//! - Document keys: `Claim|{vehicleId}|{userId}|{entityId}`
//!
//! Absent parts render as empty segments. Identifiers cannot contain `|`, so
//! the two partition schemes never collide.

const DOCUMENT_TAG: &str = "Claim";
const PARTITION_TAG: &str = "ClaimP";

fn part(value: Option<&str>) -> &str {
    value.unwrap_or_default()
}

fn is_absent(value: Option<&str>) -> bool {
    value.map_or(true, str::is_empty)
}

/// Document key for a record identified by any combination of parts
pub fn document_key(vehicle_id: Option<&str>, user_id: Option<&str>, entity_id: Option<&str>) -> String {
    format!(
        "{DOCUMENT_TAG}|{}|{}|{}",
        part(vehicle_id),
        part(user_id),
        part(entity_id)
    )
}

/// Document key of a standalone entity record
pub fn entity_document_key(entity_id: &str) -> String {
    document_key(None, None, Some(entity_id))
}

/// Partition key for a record.
///
/// Records with neither a vehicle nor a user live in the entity partition;
/// everything else lives in the vehicle/user partition regardless of any
/// linked entity.
pub fn partition_key(vehicle_id: Option<&str>, user_id: Option<&str>, entity_id: Option<&str>) -> String {
    if is_absent(vehicle_id) && is_absent(user_id) {
        entity_partition(part(entity_id))
    } else {
        vehicle_user_partition(vehicle_id, user_id)
    }
}

/// Partition scanned for an identity-tuple lookup
pub fn vehicle_user_partition(vehicle_id: Option<&str>, user_id: Option<&str>) -> String {
    format!("{PARTITION_TAG}|{}|{}", part(vehicle_id), part(user_id))
}

/// Partition holding a single entity's record
pub fn entity_partition(entity_id: &str) -> String {
    format!("{PARTITION_TAG}|{entity_id}")
}
