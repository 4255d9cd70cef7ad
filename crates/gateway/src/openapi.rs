//! OpenAPI documentation.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::handlers::auth_handler::{AuthResponse, LoginRequest, RegisterRequest};
use crate::handlers::health_handler::{DependencyHealth, DependencyStatus, HealthResponse};
use crate::handlers::service_handler::{
    CreateServiceRequest, UpdateServiceRequest, UpdateStatusRequest,
};
use crate::handlers::vehicle_handler::RegisterVehicleRequest;
use domain::{OwnerSummary, Part, ServiceRecordView, UserResponse, Vehicle, VehicleSummary};

/// API documentation struct.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health_handler::health_check,
        crate::handlers::auth_handler::register,
        crate::handlers::auth_handler::login,
        crate::handlers::auth_handler::me,
        crate::handlers::vehicle_handler::register_vehicle,
        crate::handlers::vehicle_handler::list_vehicles,
        crate::handlers::vehicle_handler::delete_vehicle,
        crate::handlers::service_handler::create_service,
        crate::handlers::service_handler::list_services,
        crate::handlers::service_handler::update_service,
        crate::handlers::service_handler::update_service_status,
        crate::handlers::events_handler::subscribe,
    ),
    components(
        schemas(
            HealthResponse,
            DependencyStatus,
            DependencyHealth,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            UserResponse,
            RegisterVehicleRequest,
            Vehicle,
            VehicleSummary,
            CreateServiceRequest,
            UpdateServiceRequest,
            UpdateStatusRequest,
            ServiceRecordView,
            OwnerSummary,
            Part,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and dependency status"),
        (name = "Authentication", description = "User authentication endpoints"),
        (name = "Vehicles", description = "Customer vehicle registry"),
        (name = "Services", description = "Service record lifecycle"),
        (name = "Events", description = "Live service record updates"),
    )
)]
pub struct ApiDoc;

/// Security scheme modifier.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
