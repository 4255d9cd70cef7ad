//! Vehicle registration and removal for vehicle owners.

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use std::sync::Arc;
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{NewVehicle, Vehicle, MIN_VEHICLE_YEAR};

use crate::repository::VehicleRepository;

/// Fields supplied when an owner registers a vehicle
#[derive(Debug, Clone)]
pub struct RegisterVehicle {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub license_plate: String,
}

#[async_trait]
pub trait VehicleService: Send + Sync {
    /// `Conflict` when the plate is already registered to anyone
    async fn register(&self, owner_user_id: Uuid, input: RegisterVehicle) -> AppResult<Vehicle>;

    async fn list(&self, owner_user_id: Uuid) -> AppResult<Vec<Vehicle>>;

    /// Only the owner may remove a vehicle. Service records logged against
    /// it stay behind and drop out of listings.
    async fn delete(&self, requester_id: Uuid, vehicle_id: Uuid) -> AppResult<()>;
}

pub struct VehicleManager {
    vehicles: Arc<dyn VehicleRepository>,
}

impl VehicleManager {
    pub fn new(vehicles: Arc<dyn VehicleRepository>) -> Self {
        Self { vehicles }
    }
}

fn validate_registration(input: &RegisterVehicle) -> AppResult<()> {
    let mut missing = Vec::new();
    if input.make.trim().is_empty() {
        missing.push("make");
    }
    if input.model.trim().is_empty() {
        missing.push("model");
    }
    if input.license_plate.trim().is_empty() {
        missing.push("licensePlate");
    }
    if !missing.is_empty() {
        return Err(AppError::validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }

    let max_year = Utc::now().year() + 1;
    if input.year < MIN_VEHICLE_YEAR || input.year > max_year {
        return Err(AppError::validation(format!(
            "year must be between {} and {}",
            MIN_VEHICLE_YEAR, max_year
        )));
    }
    Ok(())
}

#[async_trait]
impl VehicleService for VehicleManager {
    async fn register(&self, owner_user_id: Uuid, input: RegisterVehicle) -> AppResult<Vehicle> {
        validate_registration(&input)?;

        if self
            .vehicles
            .find_by_plate(&input.license_plate)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("Vehicle with this license plate"));
        }

        let vehicle = self
            .vehicles
            .create(NewVehicle::new(
                owner_user_id,
                input.make,
                input.model,
                Some(input.year),
                &input.license_plate,
            ))
            .await?;

        tracing::info!(vehicle_id = %vehicle.id, owner = %owner_user_id, "Vehicle registered");
        Ok(vehicle)
    }

    async fn list(&self, owner_user_id: Uuid) -> AppResult<Vec<Vehicle>> {
        self.vehicles.list_by_owner(owner_user_id).await
    }

    async fn delete(&self, requester_id: Uuid, vehicle_id: Uuid) -> AppResult<()> {
        let vehicle = self
            .vehicles
            .find_by_id(vehicle_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if !vehicle.is_owned_by(requester_id) {
            return Err(AppError::Forbidden);
        }

        self.vehicles.delete(vehicle_id).await?;
        tracing::info!(%vehicle_id, "Vehicle removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockVehicleRepository;
    use mockall::predicate::eq;

    fn vehicle(owner: Uuid) -> Vehicle {
        let now = Utc::now();
        Vehicle {
            id: Uuid::new_v4(),
            owner_user_id: owner,
            make: "Honda".to_string(),
            model: "Civic".to_string(),
            year: Some(2019),
            license_plate: "ABC123".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn input(plate: &str, year: i32) -> RegisterVehicle {
        RegisterVehicle {
            make: "Honda".to_string(),
            model: "Civic".to_string(),
            year,
            license_plate: plate.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_taken_plate() {
        let existing = vehicle(Uuid::new_v4());
        let mut repo = MockVehicleRepository::new();
        repo.expect_find_by_plate()
            .with(eq("abc123"))
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_create().never();

        let service = VehicleManager::new(Arc::new(repo));
        let result = service.register(Uuid::new_v4(), input("abc123", 2019)).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_validates_year() {
        let service = VehicleManager::new(Arc::new(MockVehicleRepository::new()));
        let result = service.register(Uuid::new_v4(), input("ABC123", 1700)).await;

        assert!(matches!(result, Err(AppError::Validation(msg)) if msg.contains("year")));
    }

    #[tokio::test]
    async fn test_delete_by_non_owner_is_forbidden() {
        let owned = vehicle(Uuid::new_v4());
        let vehicle_id = owned.id;
        let mut repo = MockVehicleRepository::new();
        repo.expect_find_by_id()
            .with(eq(vehicle_id))
            .returning(move |_| Ok(Some(owned.clone())));
        repo.expect_delete().never();

        let service = VehicleManager::new(Arc::new(repo));
        let result = service.delete(Uuid::new_v4(), vehicle_id).await;

        assert!(matches!(result, Err(AppError::Forbidden)));
    }
}
