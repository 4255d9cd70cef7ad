//! Service record handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use common::AppResult;
use domain::{Part, ServiceRecordView};
use workshop_service_lib::service::{
    AssignmentInput, CreateServiceRecord, ListServicesFilter, ServiceTarget, UpdateServiceRecord,
};

use crate::extractors::ValidatedJson;
use crate::middleware::{require_operator, CurrentUser};
use crate::state::AppState;

/// Booking (with `vehicleId`) or operator assignment by license plate.
///
/// `null` and missing fields are treated the same.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    /// Caller's own vehicle; takes precedence over the plate fields
    pub vehicle_id: Option<Uuid>,
    #[schema(example = "KA01AB1234")]
    pub license_plate: Option<String>,
    #[schema(example = "Honda")]
    pub make: Option<String>,
    #[schema(example = "Civic")]
    pub model: Option<String>,
    pub year: Option<i32>,
    pub customer_name: Option<String>,
    pub customer_contact: Option<String>,
    /// Initial status, pending when omitted
    #[serde(alias = "type")]
    #[schema(example = "pending")]
    pub status: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
    #[validate(length(max = 2000, message = "Description is too long"))]
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "Estimated cost must be non-negative"))]
    pub estimated_cost: Option<f64>,
    pub parts_used: Option<Vec<Part>>,
    #[validate(range(min = 0.0, message = "Total bill must be non-negative"))]
    pub total_bill: Option<f64>,
}

impl CreateServiceRequest {
    fn into_input(self, current_user: &CurrentUser) -> AppResult<CreateServiceRecord> {
        let assignment = AssignmentInput {
            license_plate: self.license_plate,
            make: self.make,
            model: self.model,
            year: self.year,
            customer_name: self.customer_name,
            customer_contact: self.customer_contact,
        };

        Ok(CreateServiceRecord {
            target: ServiceTarget::select(&current_user.requester(), self.vehicle_id, assignment)?,
            status: self.status,
            scheduled_date: self.scheduled_date,
            description: self.description,
            estimated_cost: self.estimated_cost,
            parts_used: self.parts_used,
            total_bill: self.total_bill,
        })
    }
}

/// Operator update; only the provided fields change.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    #[serde(alias = "type")]
    #[schema(example = "in-progress")]
    pub status: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
    #[validate(length(max = 2000, message = "Description is too long"))]
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "Estimated cost must be non-negative"))]
    pub estimated_cost: Option<f64>,
    pub customer_name: Option<String>,
    pub customer_contact: Option<String>,
    /// Replaces the whole parts list
    pub parts_used: Option<Vec<Part>>,
    #[validate(range(min = 0.0, message = "Total bill must be non-negative"))]
    pub total_bill: Option<f64>,
}

impl From<UpdateServiceRequest> for UpdateServiceRecord {
    fn from(request: UpdateServiceRequest) -> Self {
        Self {
            status: request.status,
            scheduled_date: request.scheduled_date,
            description: request.description,
            estimated_cost: request.estimated_cost,
            customer_name: request.customer_name,
            customer_contact: request.customer_contact,
            parts_used: request.parts_used,
            total_bill: request.total_bill,
        }
    }
}

/// Status-only update
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusRequest {
    #[validate(length(min = 1, message = "Status is required"))]
    #[schema(example = "ready-for-pickup")]
    pub status: String,
}

/// Listing options
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListServicesQuery {
    /// Operators: include picked-up records
    pub include_picked_up: Option<bool>,
    /// Operators: active worklist without picked-up and cancelled records
    pub for_admin_current_view: Option<bool>,
    /// Restrict to one vehicle
    pub vehicle_id: Option<Uuid>,
}

impl From<ListServicesQuery> for ListServicesFilter {
    fn from(query: ListServicesQuery) -> Self {
        Self {
            include_picked_up: query.include_picked_up.unwrap_or(false),
            for_admin_current_view: query.for_admin_current_view.unwrap_or(false),
            vehicle_id: query.vehicle_id,
        }
    }
}

/// Create service record routes
pub fn service_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_services).post(create_service))
        .route("/:id", put(update_service))
        .route("/:id/status", patch(update_service_status))
}

/// Book a service or assign one to a vehicle by plate
#[utoipa::path(
    post,
    path = "/services",
    tag = "Services",
    security(("bearer_auth" = [])),
    request_body = CreateServiceRequest,
    responses(
        (status = 201, description = "Service record created", body = ServiceRecordView),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Plate assignment requires an operator"),
        (status = 404, description = "Vehicle not found or not owned")
    )
)]
pub async fn create_service(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateServiceRequest>,
) -> AppResult<(StatusCode, Json<ServiceRecordView>)> {
    let input = payload.into_input(&current_user)?;
    let record = state
        .records()
        .create(current_user.requester(), input)
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// List service records visible to the caller
#[utoipa::path(
    get,
    path = "/services",
    tag = "Services",
    security(("bearer_auth" = [])),
    params(ListServicesQuery),
    responses(
        (status = 200, description = "Service records, newest scheduled first", body = Vec<ServiceRecordView>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Vehicle not found or not owned")
    )
)]
pub async fn list_services(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(query): Query<ListServicesQuery>,
) -> AppResult<Json<Vec<ServiceRecordView>>> {
    let records = state
        .records()
        .list(current_user.requester(), query.into())
        .await?;

    Ok(Json(records))
}

/// Update any field of a service record (operator only)
#[utoipa::path(
    put,
    path = "/services/{id}",
    tag = "Services",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Service record ID")
    ),
    request_body = UpdateServiceRequest,
    responses(
        (status = 200, description = "Service record updated", body = ServiceRecordView),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - operator only"),
        (status = 404, description = "Service record not found")
    )
)]
pub async fn update_service(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateServiceRequest>,
) -> AppResult<Json<ServiceRecordView>> {
    require_operator(&current_user)?;

    let record = state.records().update(id, payload.into()).await?;
    Ok(Json(record))
}

/// Change the status of a service record (operator only)
#[utoipa::path(
    patch,
    path = "/services/{id}/status",
    tag = "Services",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Service record ID")
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ServiceRecordView),
        (status = 400, description = "Unknown status or record already closed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - operator only"),
        (status = 404, description = "Service record not found")
    )
)]
pub async fn update_service_status(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateStatusRequest>,
) -> AppResult<Json<ServiceRecordView>> {
    require_operator(&current_user)?;

    let record = state.records().update_status(id, &payload.status).await?;
    Ok(Json(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::UserRole;

    fn operator() -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "ops@example.com".to_string(),
            name: "Ops".to_string(),
            role: UserRole::Admin,
        }
    }

    #[test]
    fn test_create_request_accepts_legacy_type_field() {
        let request: CreateServiceRequest = serde_json::from_value(serde_json::json!({
            "vehicleId": Uuid::new_v4(),
            "type": "in-progress",
            "description": null
        }))
        .unwrap();

        assert_eq!(request.status.as_deref(), Some("in-progress"));
        assert!(request.description.is_none());
    }

    #[test]
    fn test_create_request_prefers_vehicle_id() {
        let vehicle_id = Uuid::new_v4();
        let request: CreateServiceRequest = serde_json::from_value(serde_json::json!({
            "vehicleId": vehicle_id,
            "licensePlate": "KA01AB1234"
        }))
        .unwrap();

        let input = request.into_input(&operator()).unwrap();
        assert!(matches!(
            input.target,
            ServiceTarget::OwnVehicle { vehicle_id: id } if id == vehicle_id
        ));
    }

    #[test]
    fn test_operator_without_vehicle_id_assigns_by_plate() {
        let request: CreateServiceRequest = serde_json::from_value(serde_json::json!({
            "licensePlate": "ka01ab1234",
            "make": "Honda"
        }))
        .unwrap();

        let input = request.into_input(&operator()).unwrap();
        match input.target {
            ServiceTarget::Plate(assignment) => {
                assert_eq!(assignment.license_plate.as_deref(), Some("ka01ab1234"));
                assert_eq!(assignment.make.as_deref(), Some("Honda"));
            }
            other => panic!("expected plate assignment, got {other:?}"),
        }
    }

    #[test]
    fn test_list_query_defaults() {
        let filter: ListServicesFilter = ListServicesQuery::default().into();
        assert_eq!(filter, ListServicesFilter::default());
    }
}
