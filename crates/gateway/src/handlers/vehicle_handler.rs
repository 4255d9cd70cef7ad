//! Vehicle handlers.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use common::AppResult;
use domain::Vehicle;
use workshop_service_lib::service::RegisterVehicle;

use crate::extractors::ValidatedJson;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Vehicle registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterVehicleRequest {
    #[validate(length(min = 1, message = "Make is required"))]
    #[schema(example = "Honda")]
    pub make: String,
    #[validate(length(min = 1, message = "Model is required"))]
    #[schema(example = "Civic")]
    pub model: String,
    #[schema(example = 2019)]
    pub year: i32,
    #[validate(length(min = 1, max = 32, message = "License plate is required"))]
    #[schema(example = "KA01AB1234")]
    pub license_plate: String,
}

/// Create vehicle routes
pub fn vehicle_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles).post(register_vehicle))
        .route("/:id", delete(delete_vehicle))
}

/// Register a vehicle owned by the caller
#[utoipa::path(
    post,
    path = "/vehicles",
    tag = "Vehicles",
    security(("bearer_auth" = [])),
    request_body = RegisterVehicleRequest,
    responses(
        (status = 201, description = "Vehicle registered", body = Vehicle),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "License plate already registered")
    )
)]
pub async fn register_vehicle(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterVehicleRequest>,
) -> AppResult<(StatusCode, Json<Vehicle>)> {
    let vehicle = state
        .vehicles()
        .register(
            current_user.id,
            RegisterVehicle {
                make: payload.make,
                model: payload.model,
                year: payload.year,
                license_plate: payload.license_plate,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// List the caller's vehicles, newest model year first
#[utoipa::path(
    get,
    path = "/vehicles",
    tag = "Vehicles",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's vehicles", body = Vec<Vehicle>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_vehicles(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Vehicle>>> {
    Ok(Json(state.vehicles().list(current_user.id).await?))
}

/// Remove one of the caller's vehicles
#[utoipa::path(
    delete,
    path = "/vehicles/{id}",
    tag = "Vehicles",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Vehicle ID")
    ),
    responses(
        (status = 204, description = "Vehicle removed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - not the owner"),
        (status = 404, description = "Vehicle not found")
    )
)]
pub async fn delete_vehicle(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.vehicles().delete(current_user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
