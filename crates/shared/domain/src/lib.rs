//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.
//! The workshop service and the gateway both build on these types.

pub mod constants;
pub mod error;
pub mod password;
pub mod service_record;
pub mod user;
pub mod vehicle;

pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use password::Password;
pub use service_record::{
    validate_amount, validate_parts, NewServiceRecord, OwnerSummary, Part, ServiceRecord,
    ServiceRecordPatch, ServiceRecordView, ServiceScope, ServiceStatus,
};
pub use user::{CustomerIdentity, NewUser, User, UserResponse, UserRole};
pub use vehicle::{normalize_plate, NewVehicle, Vehicle, VehicleSummary};
