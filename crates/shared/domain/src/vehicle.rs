//! Vehicle entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical form of a license plate: trimmed and upper-cased.
///
/// Lookups and the uniqueness index both work on this form.
pub fn normalize_plate(plate: &str) -> String {
    plate.trim().to_uppercase()
}

/// A registered vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub make: String,
    pub model: String,
    /// Missing when the vehicle was first logged by an operator
    pub year: Option<i32>,
    pub license_plate: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_user_id == user_id
    }

    pub fn summary(&self) -> VehicleSummary {
        VehicleSummary {
            id: self.id,
            make: self.make.clone(),
            model: self.model.clone(),
            year: self.year,
            license_plate: self.license_plate.clone(),
        }
    }
}

/// Data needed to register a vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVehicle {
    pub owner_user_id: Uuid,
    pub make: String,
    pub model: String,
    pub year: Option<i32>,
    pub license_plate: String,
}

impl NewVehicle {
    pub fn new(
        owner_user_id: Uuid,
        make: impl Into<String>,
        model: impl Into<String>,
        year: Option<i32>,
        license_plate: &str,
    ) -> Self {
        Self {
            owner_user_id,
            make: make.into().trim().to_string(),
            model: model.into().trim().to_string(),
            year,
            license_plate: normalize_plate(license_plate),
        }
    }
}

/// Vehicle fields embedded into service record snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct VehicleSummary {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub year: Option<i32>,
    pub license_plate: String,
}
