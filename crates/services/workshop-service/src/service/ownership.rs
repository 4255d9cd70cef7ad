//! Ownership resolution for new service records.
//!
//! A record is always owned by the owner of its vehicle. Customers book
//! against a vehicle they own; operators log jobs by license plate, and a
//! plate seen for the first time becomes a vehicle owned by the operator.

use std::sync::Arc;

use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{NewVehicle, Vehicle, UNKNOWN_CUSTOMER_CONTACT, UNKNOWN_CUSTOMER_NAME};

use crate::repository::{IdentityStore, VehicleRepository};

/// The authenticated caller creating a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub id: Uuid,
    pub is_operator: bool,
}

/// Operator-supplied vehicle and customer details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentInput {
    pub license_plate: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub customer_name: Option<String>,
    pub customer_contact: Option<String>,
}

/// What a new record is booked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceTarget {
    /// Self-booking against one of the requester's vehicles
    OwnVehicle { vehicle_id: Uuid },
    /// Operator assignment by license plate
    Plate(AssignmentInput),
}

impl ServiceTarget {
    /// Pick the booking path for a request: a vehicle id always means
    /// self-booking, otherwise only operators may assign by plate.
    pub fn select(
        requester: &Requester,
        vehicle_id: Option<Uuid>,
        assignment: AssignmentInput,
    ) -> AppResult<Self> {
        match vehicle_id {
            Some(vehicle_id) => Ok(ServiceTarget::OwnVehicle { vehicle_id }),
            None if requester.is_operator => Ok(ServiceTarget::Plate(assignment)),
            None => Err(AppError::validation("vehicleId is required")),
        }
    }
}

/// Outcome of resolving a target.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub vehicle: Vehicle,
    pub owner_user_id: Uuid,
    pub customer_name: String,
    pub customer_contact: String,
    /// A vehicle was registered for a previously unseen plate
    pub vehicle_created: bool,
}

/// Validated assignment fields, trimmed.
struct Assignment {
    license_plate: String,
    make: String,
    model: String,
    year: Option<i32>,
    customer_name: String,
    customer_contact: String,
}

impl Assignment {
    fn parse(input: AssignmentInput) -> AppResult<Self> {
        fn present(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        let license_plate = present(input.license_plate);
        let make = present(input.make);
        let model = present(input.model);
        let customer_name = present(input.customer_name);
        let customer_contact = present(input.customer_contact);

        match (license_plate, make, model, customer_name, customer_contact) {
            (
                Some(license_plate),
                Some(make),
                Some(model),
                Some(customer_name),
                Some(customer_contact),
            ) => Ok(Self {
                license_plate,
                make,
                model,
                year: input.year,
                customer_name,
                customer_contact,
            }),
            (license_plate, make, model, customer_name, customer_contact) => {
                let missing: Vec<&str> = [
                    ("licensePlate", license_plate.is_none()),
                    ("make", make.is_none()),
                    ("model", model.is_none()),
                    ("customerName", customer_name.is_none()),
                    ("customerContact", customer_contact.is_none()),
                ]
                .into_iter()
                .filter_map(|(field, is_missing)| is_missing.then_some(field))
                .collect();

                Err(AppError::validation(format!(
                    "missing required fields: {}",
                    missing.join(", ")
                )))
            }
        }
    }
}

/// Resolves the vehicle and owner a new record belongs to.
pub struct OwnershipResolver {
    vehicles: Arc<dyn VehicleRepository>,
    identities: Arc<dyn IdentityStore>,
}

impl OwnershipResolver {
    pub fn new(vehicles: Arc<dyn VehicleRepository>, identities: Arc<dyn IdentityStore>) -> Self {
        Self {
            vehicles,
            identities,
        }
    }

    pub async fn resolve(
        &self,
        requester: &Requester,
        target: ServiceTarget,
    ) -> AppResult<Resolution> {
        match target {
            ServiceTarget::OwnVehicle { vehicle_id } => {
                self.resolve_own_vehicle(requester, vehicle_id).await
            }
            ServiceTarget::Plate(input) => {
                if !requester.is_operator {
                    return Err(AppError::Forbidden);
                }
                self.resolve_assignment(requester, Assignment::parse(input)?)
                    .await
            }
        }
    }

    async fn resolve_own_vehicle(
        &self,
        requester: &Requester,
        vehicle_id: Uuid,
    ) -> AppResult<Resolution> {
        let vehicle = self
            .vehicles
            .find_by_id_and_owner(vehicle_id, requester.id)
            .await?
            .ok_or(AppError::NotFound)?;

        // Booking never blocks on the identity lookup
        let (customer_name, customer_contact) =
            match self.identities.find_identity(requester.id).await {
                Ok(identity) => (identity.name, identity.contact),
                Err(e) => {
                    tracing::warn!(
                        user_id = %requester.id,
                        error = %e,
                        "Customer identity unavailable, using placeholders"
                    );
                    (
                        UNKNOWN_CUSTOMER_NAME.to_string(),
                        UNKNOWN_CUSTOMER_CONTACT.to_string(),
                    )
                }
            };

        Ok(Resolution {
            owner_user_id: vehicle.owner_user_id,
            vehicle,
            customer_name,
            customer_contact,
            vehicle_created: false,
        })
    }

    async fn resolve_assignment(
        &self,
        requester: &Requester,
        input: Assignment,
    ) -> AppResult<Resolution> {
        let existing = self.vehicles.find_by_plate(&input.license_plate).await?;
        let (vehicle, vehicle_created) = match existing {
            Some(vehicle) => (vehicle, false),
            None => {
                let new_vehicle = NewVehicle::new(
                    requester.id,
                    input.make,
                    input.model,
                    input.year,
                    &input.license_plate,
                );
                match self.vehicles.create(new_vehicle).await {
                    Ok(vehicle) => {
                        tracing::info!(
                            vehicle_id = %vehicle.id,
                            operator = %requester.id,
                            "Registered vehicle for unseen plate"
                        );
                        (vehicle, true)
                    }
                    // Another request registered the plate first
                    Err(AppError::Conflict(_)) => {
                        let vehicle = self
                            .vehicles
                            .find_by_plate(&input.license_plate)
                            .await?
                            .ok_or_else(|| {
                                AppError::internal("plate conflict but vehicle not found")
                            })?;
                        (vehicle, false)
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        Ok(Resolution {
            owner_user_id: vehicle.owner_user_id,
            vehicle,
            customer_name: input.customer_name,
            customer_contact: input.customer_contact,
            vehicle_created,
        })
    }
}
