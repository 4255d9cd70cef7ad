//! Service record entity and its status lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::constants::{
    LEGACY_SERVICE_TYPES, STATUS_CANCELLED, STATUS_IN_PROGRESS, STATUS_PENDING, STATUS_PICKED_UP,
    STATUS_READY_FOR_PICKUP,
};
use crate::error::{DomainError, DomainResult};
use crate::vehicle::VehicleSummary;

// =============================================================================
// Status
// =============================================================================

/// Lifecycle state of a service job.
///
/// `PickedUp` and `Cancelled` are terminal. Values written by older clients
/// (free-text service types) load as `Legacy` instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ServiceStatus {
    #[default]
    Pending,
    InProgress,
    ReadyForPickup,
    PickedUp,
    Cancelled,
    Legacy(String),
}

impl ServiceStatus {
    /// Every canonical lifecycle state, in lifecycle order.
    pub const CANONICAL: [ServiceStatus; 5] = [
        ServiceStatus::Pending,
        ServiceStatus::InProgress,
        ServiceStatus::ReadyForPickup,
        ServiceStatus::PickedUp,
        ServiceStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ServiceStatus::Pending => STATUS_PENDING,
            ServiceStatus::InProgress => STATUS_IN_PROGRESS,
            ServiceStatus::ReadyForPickup => STATUS_READY_FOR_PICKUP,
            ServiceStatus::PickedUp => STATUS_PICKED_UP,
            ServiceStatus::Cancelled => STATUS_CANCELLED,
            ServiceStatus::Legacy(value) => value,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ServiceStatus::PickedUp | ServiceStatus::Cancelled)
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, ServiceStatus::Legacy(_))
    }

    /// Parse a status supplied by a client.
    ///
    /// Accepts the canonical values and the known legacy service types;
    /// anything else is a validation error.
    pub fn parse(value: &str) -> DomainResult<Self> {
        let trimmed = value.trim();
        match ServiceStatus::from(trimmed) {
            ServiceStatus::Legacy(legacy) if !LEGACY_SERVICE_TYPES.contains(&legacy.as_str()) => {
                Err(DomainError::validation(format!(
                    "status: '{}' is not one of {}",
                    trimmed,
                    Self::CANONICAL
                        .iter()
                        .map(ServiceStatus::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                )))
            }
            status => Ok(status),
        }
    }

    /// Check that a record currently in `self` may move to `next`.
    ///
    /// Only terminal states restrict transitions; re-applying the same
    /// terminal state is allowed.
    pub fn ensure_transition(&self, next: &ServiceStatus) -> DomainResult<()> {
        if self.is_terminal() && self != next {
            return Err(DomainError::validation(format!(
                "status: a {} service record cannot be moved to {}",
                self, next
            )));
        }
        Ok(())
    }
}

impl From<&str> for ServiceStatus {
    fn from(value: &str) -> Self {
        match value {
            STATUS_PENDING => ServiceStatus::Pending,
            STATUS_IN_PROGRESS => ServiceStatus::InProgress,
            STATUS_READY_FOR_PICKUP => ServiceStatus::ReadyForPickup,
            STATUS_PICKED_UP => ServiceStatus::PickedUp,
            STATUS_CANCELLED => ServiceStatus::Cancelled,
            other => ServiceStatus::Legacy(other.to_string()),
        }
    }
}

impl From<String> for ServiceStatus {
    fn from(value: String) -> Self {
        ServiceStatus::from(value.as_str())
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ServiceStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ServiceStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(ServiceStatus::from)
    }
}

// =============================================================================
// Parts
// =============================================================================

fn default_quantity() -> u32 {
    1
}

/// A part fitted during a service job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub part_name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub unit_cost: f64,
}

impl Part {
    pub fn new(part_name: impl Into<String>, quantity: u32, unit_cost: f64) -> Self {
        Self {
            part_name: part_name.into(),
            quantity,
            unit_cost,
        }
    }
}

/// Validate a parts list, naming the offending entry.
pub fn validate_parts(parts: &[Part]) -> DomainResult<()> {
    for (index, part) in parts.iter().enumerate() {
        if part.part_name.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "partsUsed[{}].partName is required",
                index
            )));
        }
        if part.quantity < 1 {
            return Err(DomainError::validation(format!(
                "partsUsed[{}].quantity must be at least 1",
                index
            )));
        }
        validate_amount(&format!("partsUsed[{}].unitCost", index), part.unit_cost)?;
    }
    Ok(())
}

/// Monetary amounts must be finite and non-negative.
pub fn validate_amount(field: &str, value: f64) -> DomainResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::validation(format!(
            "{} must be a non-negative number",
            field
        )));
    }
    Ok(())
}

// =============================================================================
// Service Record
// =============================================================================

/// A service job logged against a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub vehicle_id: Uuid,
    pub status: ServiceStatus,
    pub scheduled_date: DateTime<Utc>,
    pub description: Option<String>,
    pub estimated_cost: f64,
    pub customer_name: String,
    pub customer_contact: String,
    pub parts_used: Vec<Part>,
    pub total_bill: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceRecord {
    /// Whether the sweep would cancel this record at `cutoff`.
    pub fn is_stale_pending(&self, cutoff: DateTime<Utc>) -> bool {
        self.status == ServiceStatus::Pending && self.scheduled_date <= cutoff
    }
}

/// Fields of a record about to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewServiceRecord {
    pub owner_user_id: Uuid,
    pub vehicle_id: Uuid,
    pub status: ServiceStatus,
    pub scheduled_date: DateTime<Utc>,
    pub description: Option<String>,
    pub estimated_cost: f64,
    pub customer_name: String,
    pub customer_contact: String,
    pub parts_used: Vec<Part>,
    pub total_bill: f64,
}

impl NewServiceRecord {
    pub fn validate(&self) -> DomainResult<()> {
        validate_amount("estimatedCost", self.estimated_cost)?;
        validate_amount("totalBill", self.total_bill)?;
        validate_parts(&self.parts_used)
    }
}

/// Field-level update. `None` leaves a field untouched; `Some("")` is a
/// real value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceRecordPatch {
    pub status: Option<ServiceStatus>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub estimated_cost: Option<f64>,
    pub customer_name: Option<String>,
    pub customer_contact: Option<String>,
    /// Replaces the whole list when present
    pub parts_used: Option<Vec<Part>>,
    pub total_bill: Option<f64>,
}

impl ServiceRecordPatch {
    pub fn is_empty(&self) -> bool {
        *self == ServiceRecordPatch::default()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Some(cost) = self.estimated_cost {
            validate_amount("estimatedCost", cost)?;
        }
        if let Some(bill) = self.total_bill {
            validate_amount("totalBill", bill)?;
        }
        if let Some(parts) = &self.parts_used {
            validate_parts(parts)?;
        }
        Ok(())
    }
}

/// Which records a listing may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceScope {
    /// Records owned by one user, optionally for a single vehicle
    Owner {
        owner_user_id: Uuid,
        vehicle_id: Option<Uuid>,
    },
    /// Every record except the excluded statuses
    Operator {
        exclude_statuses: Vec<ServiceStatus>,
        vehicle_id: Option<Uuid>,
    },
}

impl ServiceScope {
    pub fn vehicle_id(&self) -> Option<Uuid> {
        match self {
            ServiceScope::Owner { vehicle_id, .. } | ServiceScope::Operator { vehicle_id, .. } => {
                *vehicle_id
            }
        }
    }
}

// =============================================================================
// Associated snapshot
// =============================================================================

/// Owner identity embedded into record snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: Uuid,
    pub name: String,
    pub contact: String,
}

/// A service record with its vehicle and owner resolved.
///
/// This is what API responses and live events carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecordView {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub vehicle_id: Uuid,
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "pending"))]
    pub status: ServiceStatus,
    pub scheduled_date: DateTime<Utc>,
    pub description: Option<String>,
    pub estimated_cost: f64,
    pub customer_name: String,
    pub customer_contact: String,
    pub parts_used: Vec<Part>,
    pub total_bill: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub vehicle: Option<VehicleSummary>,
    pub owner: Option<OwnerSummary>,
}

impl ServiceRecordView {
    pub fn new(
        record: ServiceRecord,
        vehicle: Option<VehicleSummary>,
        owner: Option<OwnerSummary>,
    ) -> Self {
        Self {
            id: record.id,
            owner_user_id: record.owner_user_id,
            vehicle_id: record.vehicle_id,
            status: record.status,
            scheduled_date: record.scheduled_date,
            description: record.description,
            estimated_cost: record.estimated_cost,
            customer_name: record.customer_name,
            customer_contact: record.customer_contact,
            parts_used: record.parts_used,
            total_bill: record.total_bill,
            created_at: record.created_at,
            updated_at: record.updated_at,
            vehicle,
            owner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_canonical_values() {
        for status in ServiceStatus::CANONICAL {
            assert_eq!(ServiceStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_status_accepts_known_legacy_values() {
        let status = ServiceStatus::parse("Oil Change").unwrap();
        assert_eq!(status, ServiceStatus::Legacy("Oil Change".to_string()));
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_status_rejects_unknown_values() {
        let err = ServiceStatus::parse("done").unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("done")));
    }

    #[test]
    fn test_unknown_stored_value_loads_as_legacy() {
        let status: ServiceStatus = serde_json::from_str("\"Wheel Alignment\"").unwrap();
        assert_eq!(status, ServiceStatus::Legacy("Wheel Alignment".to_string()));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"Wheel Alignment\"");
    }

    #[test]
    fn test_terminal_states_are_sticky() {
        assert!(ServiceStatus::PickedUp
            .ensure_transition(&ServiceStatus::Pending)
            .is_err());
        assert!(ServiceStatus::Cancelled
            .ensure_transition(&ServiceStatus::InProgress)
            .is_err());
        assert!(ServiceStatus::Cancelled
            .ensure_transition(&ServiceStatus::Cancelled)
            .is_ok());
    }

    #[test]
    fn test_non_terminal_states_move_freely() {
        assert!(ServiceStatus::InProgress
            .ensure_transition(&ServiceStatus::Pending)
            .is_ok());
        assert!(ServiceStatus::Legacy("Other".into())
            .ensure_transition(&ServiceStatus::PickedUp)
            .is_ok());
    }

    #[test]
    fn test_part_defaults() {
        let part: Part = serde_json::from_str(r#"{"partName":"Oil filter"}"#).unwrap();
        assert_eq!(part.quantity, 1);
        assert_eq!(part.unit_cost, 0.0);
    }

    #[test]
    fn test_validate_parts_names_offending_entry() {
        let parts = vec![Part::new("Filter", 1, 4.5), Part::new("Bolt", 0, 0.2)];
        let err = validate_parts(&parts).unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("partsUsed[1].quantity must be at least 1")
        );
    }

    #[test]
    fn test_negative_amounts_rejected() {
        let patch = ServiceRecordPatch {
            total_bill: Some(-1.0),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_empty_patch() {
        assert!(ServiceRecordPatch::default().is_empty());
        let patch = ServiceRecordPatch {
            description: Some(String::new()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
