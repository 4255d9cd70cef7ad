//! Assembly of fully associated record snapshots.
//!
//! Snapshots are taken after a write has committed, so association lookups
//! are best-effort: a failing store degrades the snapshot instead of
//! failing the write that produced it.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::join;
use uuid::Uuid;

use common::AppResult;
use domain::{CustomerIdentity, OwnerSummary, ServiceRecord, ServiceRecordView, Vehicle};

use crate::repository::{IdentityStore, VehicleRepository};

/// Resolves vehicle and owner for records so responses and live events
/// carry the same shape.
pub struct RecordAssembler {
    vehicles: Arc<dyn VehicleRepository>,
    identities: Arc<dyn IdentityStore>,
}

/// Owner as currently known to the identity store, or as captured on the
/// record when the store could not be asked.
enum Owners {
    Resolved(HashMap<Uuid, CustomerIdentity>),
    Unavailable,
}

impl Owners {
    fn from_lookup(lookup: AppResult<HashMap<Uuid, CustomerIdentity>>) -> Self {
        match lookup {
            Ok(identities) => Owners::Resolved(identities),
            Err(e) => {
                tracing::warn!(error = %e, "Identity lookup failed, using record snapshot");
                Owners::Unavailable
            }
        }
    }

    fn summary(&self, record: &ServiceRecord) -> Option<OwnerSummary> {
        match self {
            Owners::Resolved(identities) => {
                identities
                    .get(&record.owner_user_id)
                    .map(|identity| OwnerSummary {
                        id: record.owner_user_id,
                        name: identity.name.clone(),
                        contact: identity.contact.clone(),
                    })
            }
            Owners::Unavailable => Some(OwnerSummary {
                id: record.owner_user_id,
                name: record.customer_name.clone(),
                contact: record.customer_contact.clone(),
            }),
        }
    }
}

impl RecordAssembler {
    pub fn new(vehicles: Arc<dyn VehicleRepository>, identities: Arc<dyn IdentityStore>) -> Self {
        Self {
            vehicles,
            identities,
        }
    }

    /// Re-read the associations of a freshly written record.
    pub async fn load(&self, record: ServiceRecord) -> ServiceRecordView {
        let (vehicle, identities) = join!(
            self.vehicles.find_by_id(record.vehicle_id),
            self.identities.find_identities(vec![record.owner_user_id]),
        );

        let vehicle = match vehicle {
            Ok(vehicle) => vehicle.as_ref().map(Vehicle::summary),
            Err(e) => {
                tracing::warn!(record_id = %record.id, error = %e, "Vehicle lookup failed");
                None
            }
        };
        let owner = Owners::from_lookup(identities).summary(&record);

        ServiceRecordView::new(record, vehicle, owner)
    }

    /// Attach owners to records already joined with their vehicles, using a
    /// single identity lookup.
    pub async fn assemble(&self, rows: Vec<(ServiceRecord, Vehicle)>) -> Vec<ServiceRecordView> {
        let mut owner_ids: Vec<_> = rows
            .iter()
            .map(|(record, _)| record.owner_user_id)
            .collect();
        owner_ids.sort_unstable();
        owner_ids.dedup();

        let owners = Owners::from_lookup(self.identities.find_identities(owner_ids).await);

        rows.into_iter()
            .map(|(record, vehicle)| {
                let owner = owners.summary(&record);
                ServiceRecordView::new(record, Some(vehicle.summary()), owner)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::AppError;
    use domain::ServiceStatus;

    use crate::repository::{MockIdentityStore, MockVehicleRepository};

    fn record() -> ServiceRecord {
        ServiceRecord {
            id: Uuid::new_v4(),
            owner_user_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            status: ServiceStatus::Pending,
            scheduled_date: Utc::now(),
            description: None,
            estimated_cost: 0.0,
            customer_name: "Jane".to_string(),
            customer_contact: "555-0100".to_string(),
            parts_used: Vec::new(),
            total_bill: 0.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_load_falls_back_to_record_snapshot_when_stores_fail() {
        let mut vehicles = MockVehicleRepository::new();
        vehicles
            .expect_find_by_id()
            .returning(|_| Err(AppError::internal("vehicles down")));
        let mut identities = MockIdentityStore::new();
        identities
            .expect_find_identities()
            .returning(|_| Err(AppError::internal("identities down")));

        let assembler = RecordAssembler::new(Arc::new(vehicles), Arc::new(identities));
        let record = record();
        let owner_id = record.owner_user_id;

        let view = assembler.load(record).await;

        assert!(view.vehicle.is_none());
        let owner = view.owner.unwrap();
        assert_eq!(owner.id, owner_id);
        assert_eq!(owner.name, "Jane");
        assert_eq!(owner.contact, "555-0100");
    }

    #[tokio::test]
    async fn test_missing_identity_leaves_owner_empty() {
        let mut vehicles = MockVehicleRepository::new();
        vehicles.expect_find_by_id().returning(|_| Ok(None));
        let mut identities = MockIdentityStore::new();
        identities
            .expect_find_identities()
            .returning(|_| Ok(HashMap::new()));

        let assembler = RecordAssembler::new(Arc::new(vehicles), Arc::new(identities));
        let view = assembler.load(record()).await;

        assert!(view.owner.is_none());
    }
}
