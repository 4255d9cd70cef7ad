//! Service record lifecycle: booking, operator updates, status changes and
//! listings.
//!
//! Every successful write is followed by exactly one published snapshot of
//! the stored record. Failures return before anything is published.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{
    validate_amount, validate_parts, NewServiceRecord, Part, ServiceRecord, ServiceRecordPatch,
    ServiceRecordView, ServiceScope, ServiceStatus,
};

use crate::events::{EventPublisher, ServiceEvent};
use crate::repository::{ServiceRecordRepository, VehicleRepository};
use crate::service::ownership::{OwnershipResolver, Requester, ServiceTarget};
use crate::service::views::RecordAssembler;

/// A booking or operator assignment.
#[derive(Debug, Clone)]
pub struct CreateServiceRecord {
    pub target: ServiceTarget,
    /// Defaults to pending
    pub status: Option<String>,
    /// Defaults to now
    pub scheduled_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub estimated_cost: Option<f64>,
    pub parts_used: Option<Vec<Part>>,
    pub total_bill: Option<f64>,
}

/// Operator full-field update; absent fields stay untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateServiceRecord {
    pub status: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub estimated_cost: Option<f64>,
    pub customer_name: Option<String>,
    pub customer_contact: Option<String>,
    pub parts_used: Option<Vec<Part>>,
    pub total_bill: Option<f64>,
}

impl UpdateServiceRecord {
    fn into_patch(self) -> AppResult<ServiceRecordPatch> {
        let status = self
            .status
            .as_deref()
            .map(ServiceStatus::parse)
            .transpose()?;

        let patch = ServiceRecordPatch {
            status,
            scheduled_date: self.scheduled_date,
            description: self.description,
            estimated_cost: self.estimated_cost,
            customer_name: self.customer_name,
            customer_contact: self.customer_contact,
            parts_used: self.parts_used,
            total_bill: self.total_bill,
        };
        patch.validate()?;
        Ok(patch)
    }
}

/// Listing options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListServicesFilter {
    /// Operators only: include picked-up records
    pub include_picked_up: bool,
    /// Operators only: active worklist, without picked-up and cancelled
    pub for_admin_current_view: bool,
    pub vehicle_id: Option<Uuid>,
}

impl ListServicesFilter {
    fn excluded_statuses(&self) -> Vec<ServiceStatus> {
        if self.for_admin_current_view {
            vec![ServiceStatus::PickedUp, ServiceStatus::Cancelled]
        } else if self.include_picked_up {
            Vec::new()
        } else {
            vec![ServiceStatus::PickedUp]
        }
    }
}

#[async_trait]
pub trait ServiceRecordService: Send + Sync {
    async fn create(
        &self,
        requester: Requester,
        input: CreateServiceRecord,
    ) -> AppResult<ServiceRecordView>;

    /// Operator full-field update
    async fn update(&self, id: Uuid, input: UpdateServiceRecord) -> AppResult<ServiceRecordView>;

    /// Operator status-only update
    async fn update_status(&self, id: Uuid, status: &str) -> AppResult<ServiceRecordView>;

    async fn list(
        &self,
        requester: Requester,
        filter: ListServicesFilter,
    ) -> AppResult<Vec<ServiceRecordView>>;
}

pub struct ServiceDesk {
    records: Arc<dyn ServiceRecordRepository>,
    vehicles: Arc<dyn VehicleRepository>,
    resolver: OwnershipResolver,
    assembler: Arc<RecordAssembler>,
    publisher: Arc<dyn EventPublisher>,
}

impl ServiceDesk {
    pub fn new(
        records: Arc<dyn ServiceRecordRepository>,
        vehicles: Arc<dyn VehicleRepository>,
        resolver: OwnershipResolver,
        assembler: Arc<RecordAssembler>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            records,
            vehicles,
            resolver,
            assembler,
            publisher,
        }
    }

    /// Snapshot a written record and hand it to subscribers. Infallible:
    /// the write has already committed.
    async fn publish_written(&self, record: ServiceRecord) -> ServiceRecordView {
        let view = self.assembler.load(record).await;
        self.publisher.publish(ServiceEvent::service_update(view.clone()));
        view
    }

    async fn current(&self, id: Uuid) -> AppResult<ServiceRecord> {
        self.records.find_by_id(id).await?.ok_or(AppError::NotFound)
    }
}

#[async_trait]
impl ServiceRecordService for ServiceDesk {
    async fn create(
        &self,
        requester: Requester,
        input: CreateServiceRecord,
    ) -> AppResult<ServiceRecordView> {
        // Validate everything before the resolver may register a vehicle
        let status = match input.status.as_deref() {
            Some(status) => ServiceStatus::parse(status)?,
            None => ServiceStatus::default(),
        };
        let estimated_cost = input.estimated_cost.unwrap_or(0.0);
        let total_bill = input.total_bill.unwrap_or(0.0);
        let parts_used = input.parts_used.unwrap_or_default();
        validate_amount("estimatedCost", estimated_cost)?;
        validate_amount("totalBill", total_bill)?;
        validate_parts(&parts_used)?;

        let resolution = self.resolver.resolve(&requester, input.target).await?;

        let new_record = NewServiceRecord {
            owner_user_id: resolution.owner_user_id,
            vehicle_id: resolution.vehicle.id,
            status,
            scheduled_date: input.scheduled_date.unwrap_or_else(Utc::now),
            description: input.description,
            estimated_cost,
            customer_name: resolution.customer_name,
            customer_contact: resolution.customer_contact,
            parts_used,
            total_bill,
        };
        new_record.validate()?;

        let record = self.records.create(new_record).await?;
        tracing::info!(
            record_id = %record.id,
            owner = %record.owner_user_id,
            requester = %requester.id,
            vehicle_created = resolution.vehicle_created,
            "Service record created"
        );

        Ok(self.publish_written(record).await)
    }

    async fn update(&self, id: Uuid, input: UpdateServiceRecord) -> AppResult<ServiceRecordView> {
        let patch = input.into_patch()?;
        if patch.is_empty() {
            return Err(AppError::validation("at least one field must be provided"));
        }

        let current = self.current(id).await?;
        if let Some(next) = &patch.status {
            current.status.ensure_transition(next)?;
        }

        let record = self.records.update_fields(id, patch).await?;
        tracing::info!(record_id = %id, status = %record.status, "Service record updated");

        Ok(self.publish_written(record).await)
    }

    async fn update_status(&self, id: Uuid, status: &str) -> AppResult<ServiceRecordView> {
        let next = ServiceStatus::parse(status)?;

        let current = self.current(id).await?;
        current.status.ensure_transition(&next)?;

        let record = self.records.set_status(id, next).await?;
        tracing::info!(
            record_id = %id,
            from = %current.status,
            to = %record.status,
            "Service status changed"
        );

        Ok(self.publish_written(record).await)
    }

    async fn list(
        &self,
        requester: Requester,
        filter: ListServicesFilter,
    ) -> AppResult<Vec<ServiceRecordView>> {
        let scope = if requester.is_operator {
            ServiceScope::Operator {
                exclude_statuses: filter.excluded_statuses(),
                vehicle_id: filter.vehicle_id,
            }
        } else {
            if let Some(vehicle_id) = filter.vehicle_id {
                self.vehicles
                    .find_by_id_and_owner(vehicle_id, requester.id)
                    .await?
                    .ok_or(AppError::NotFound)?;
            }
            ServiceScope::Owner {
                owner_user_id: requester.id,
                vehicle_id: filter.vehicle_id,
            }
        };

        let rows = self.records.query(scope).await?;
        Ok(self.assembler.assemble(rows).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_exclusions() {
        let default = ListServicesFilter::default();
        assert_eq!(default.excluded_statuses(), vec![ServiceStatus::PickedUp]);

        let all = ListServicesFilter {
            include_picked_up: true,
            ..Default::default()
        };
        assert!(all.excluded_statuses().is_empty());

        let worklist = ListServicesFilter {
            include_picked_up: true,
            for_admin_current_view: true,
            vehicle_id: None,
        };
        assert_eq!(
            worklist.excluded_statuses(),
            vec![ServiceStatus::PickedUp, ServiceStatus::Cancelled]
        );
    }

    #[test]
    fn test_update_rejects_unknown_status_before_store() {
        let input = UpdateServiceRecord {
            status: Some("finished".to_string()),
            ..Default::default()
        };
        assert!(matches!(input.into_patch(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_update_keeps_empty_string_distinct_from_absent() {
        let input = UpdateServiceRecord {
            description: Some(String::new()),
            ..Default::default()
        };
        let patch = input.into_patch().unwrap();
        assert_eq!(patch.description, Some(String::new()));
        assert!(patch.customer_name.is_none());
    }
}
