//! Service layer - business logic on top of the repositories.

mod auth_service;
mod container;
mod ownership;
mod service_desk;
mod sweep;
mod vehicle_service;
mod views;

pub use auth_service::{AuthService, Authenticator, Claims, Registration, TokenResponse};
pub use container::WorkshopServices;
pub use ownership::{AssignmentInput, OwnershipResolver, Requester, Resolution, ServiceTarget};
pub use service_desk::{
    CreateServiceRecord, ListServicesFilter, ServiceDesk, ServiceRecordService,
    UpdateServiceRecord,
};
pub use sweep::{AutoCancelSweep, SweepReport};
pub use vehicle_service::{RegisterVehicle, VehicleManager, VehicleService};
pub use views::RecordAssembler;
