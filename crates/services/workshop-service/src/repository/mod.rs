//! Repository layer for data access.

pub mod entities;
mod service_record_repository;
mod user_repository;
mod vehicle_repository;

use common::AppError;
use sea_orm::{DbErr, SqlErr};

pub use service_record_repository::{ServiceRecordRepository, ServiceRecordStore};
pub use user_repository::{IdentityStore, UserRepository, UserStore};
pub use vehicle_repository::{VehicleRepository, VehicleStore};

#[cfg(any(test, feature = "test-utils"))]
pub use service_record_repository::MockServiceRecordRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::{MockIdentityStore, MockUserRepository};
#[cfg(any(test, feature = "test-utils"))]
pub use vehicle_repository::MockVehicleRepository;

/// Map a unique index violation to a conflict on `entity`.
fn conflict_on_unique(err: DbErr, entity: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::conflict(entity),
        _ => AppError::from(err),
    }
}
