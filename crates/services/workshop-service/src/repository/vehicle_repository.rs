//! Vehicle repository implementation.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::conflict_on_unique;
use super::entities::vehicle::{self, ActiveModel, Entity as VehicleEntity};
use common::{AppError, AppResult};
use domain::{normalize_plate, NewVehicle, Vehicle};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Vehicle store used by vehicle registration and ownership resolution.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>>;

    /// Only matches when `owner_user_id` owns the vehicle
    async fn find_by_id_and_owner(
        &self,
        id: Uuid,
        owner_user_id: Uuid,
    ) -> AppResult<Option<Vehicle>>;

    /// Cross-owner lookup; the plate is normalised first
    async fn find_by_plate(&self, license_plate: &str) -> AppResult<Option<Vehicle>>;

    /// Vehicles of one owner, newest model year first
    async fn list_by_owner(&self, owner_user_id: Uuid) -> AppResult<Vec<Vehicle>>;

    /// `Conflict` when the plate is already registered
    async fn create(&self, vehicle: NewVehicle) -> AppResult<Vehicle>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

/// SeaORM-backed vehicle store
pub struct VehicleStore {
    db: DatabaseConnection,
}

impl VehicleStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VehicleRepository for VehicleStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let result = VehicleEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Vehicle::from))
    }

    async fn find_by_id_and_owner(
        &self,
        id: Uuid,
        owner_user_id: Uuid,
    ) -> AppResult<Option<Vehicle>> {
        let result = VehicleEntity::find_by_id(id)
            .filter(vehicle::Column::OwnerUserId.eq(owner_user_id))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Vehicle::from))
    }

    async fn find_by_plate(&self, license_plate: &str) -> AppResult<Option<Vehicle>> {
        let result = VehicleEntity::find()
            .filter(vehicle::Column::LicensePlate.eq(normalize_plate(license_plate)))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Vehicle::from))
    }

    async fn list_by_owner(&self, owner_user_id: Uuid) -> AppResult<Vec<Vehicle>> {
        let models = VehicleEntity::find()
            .filter(vehicle::Column::OwnerUserId.eq(owner_user_id))
            .order_by_desc(vehicle::Column::Year)
            .order_by_desc(vehicle::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(Vehicle::from).collect())
    }

    async fn create(&self, vehicle: NewVehicle) -> AppResult<Vehicle> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_user_id: Set(vehicle.owner_user_id),
            make: Set(vehicle.make),
            model: Set(vehicle.model),
            year: Set(vehicle.year),
            license_plate: Set(normalize_plate(&vehicle.license_plate)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| conflict_on_unique(e, "Vehicle with this license plate"))?;
        Ok(Vehicle::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = VehicleEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }
}
