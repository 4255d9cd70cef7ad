//! Service record store.
//!
//! Writes are last-write-wins per record: there is no version column, so
//! concurrent updates of the same id race and the later commit wins. Status
//! writes are the exception: closed records are filtered out in the UPDATE
//! itself, so a record closed by a concurrent writer stays closed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::entities::service_record::{self, parts_to_json, ActiveModel, Entity as RecordEntity};
use super::entities::vehicle::Entity as VehicleEntity;
use common::{AppError, AppResult};
use domain::{
    NewServiceRecord, ServiceRecord, ServiceRecordPatch, ServiceScope, ServiceStatus, Vehicle,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ServiceRecordRepository: Send + Sync {
    /// Persist a new record, assigning id and timestamps
    async fn create(&self, record: NewServiceRecord) -> AppResult<ServiceRecord>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ServiceRecord>>;

    /// Write only the fields present in `patch`
    async fn update_fields(&self, id: Uuid, patch: ServiceRecordPatch) -> AppResult<ServiceRecord>;

    /// Write only `status` and `updated_at`. Like `update_fields` with a
    /// status, the write is refused once the stored record is closed.
    async fn set_status(&self, id: Uuid, status: ServiceStatus) -> AppResult<ServiceRecord>;

    /// Records visible in `scope` with their vehicle, newest scheduled first.
    /// Records whose vehicle no longer exists are left out.
    async fn query(&self, scope: ServiceScope) -> AppResult<Vec<(ServiceRecord, Vehicle)>>;

    /// Cancel every pending record scheduled at or before `cutoff`,
    /// overwriting its description with `note`. Returns exactly the records
    /// this call moved to cancelled.
    async fn cancel_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
        note: String,
    ) -> AppResult<Vec<ServiceRecord>>;
}

/// SeaORM-backed service record store
pub struct ServiceRecordStore {
    db: DatabaseConnection,
}

impl ServiceRecordStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(&self, id: Uuid) -> AppResult<service_record::Model> {
        RecordEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Explain a guarded status write that matched no row: either the id is
    /// unknown or the record was closed before the write landed.
    async fn rejected_write(&self, id: Uuid, next: &ServiceStatus) -> AppError {
        let current = match self.find_model(id).await {
            Ok(model) => ServiceStatus::from(model.status),
            Err(e) => return e,
        };

        match current.ensure_transition(next) {
            Err(e) => e.into(),
            Ok(()) => {
                AppError::validation(format!("status: service record is already {}", current))
            }
        }
    }
}

/// Matches rows that are still open, or already in `next` (re-setting a
/// closed record to its own status is a no-op write).
fn open_or_same(next: &ServiceStatus) -> Condition {
    let terminal: Vec<String> = ServiceStatus::CANONICAL
        .iter()
        .filter(|status| status.is_terminal())
        .map(|status| status.to_string())
        .collect();

    Condition::any()
        .add(service_record::Column::Status.is_not_in(terminal))
        .add(service_record::Column::Status.eq(next.to_string()))
}

#[async_trait]
impl ServiceRecordRepository for ServiceRecordStore {
    async fn create(&self, record: NewServiceRecord) -> AppResult<ServiceRecord> {
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_user_id: Set(record.owner_user_id),
            vehicle_id: Set(record.vehicle_id),
            status: Set(record.status.to_string()),
            scheduled_date: Set(record.scheduled_date),
            description: Set(record.description),
            estimated_cost: Set(record.estimated_cost),
            customer_name: Set(record.customer_name),
            customer_contact: Set(record.customer_contact),
            parts_used: Set(parts_to_json(&record.parts_used)),
            total_bill: Set(record.total_bill),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await.map_err(AppError::from)?;
        Ok(ServiceRecord::from(model))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ServiceRecord>> {
        let result = RecordEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(ServiceRecord::from))
    }

    async fn update_fields(&self, id: Uuid, patch: ServiceRecordPatch) -> AppResult<ServiceRecord> {
        // Only columns set here end up in the UPDATE statement
        let mut active = <ActiveModel as ActiveModelTrait>::default();
        if let Some(status) = &patch.status {
            active.status = Set(status.to_string());
        }
        if let Some(scheduled_date) = patch.scheduled_date {
            active.scheduled_date = Set(scheduled_date);
        }
        if let Some(description) = patch.description {
            active.description = Set(Some(description));
        }
        if let Some(estimated_cost) = patch.estimated_cost {
            active.estimated_cost = Set(estimated_cost);
        }
        if let Some(customer_name) = patch.customer_name {
            active.customer_name = Set(customer_name);
        }
        if let Some(customer_contact) = patch.customer_contact {
            active.customer_contact = Set(customer_contact);
        }
        if let Some(parts_used) = patch.parts_used {
            active.parts_used = Set(parts_to_json(&parts_used));
        }
        if let Some(total_bill) = patch.total_bill {
            active.total_bill = Set(total_bill);
        }
        active.updated_at = Set(Utc::now());

        let mut update = RecordEntity::update_many()
            .set(active)
            .filter(service_record::Column::Id.eq(id));
        if let Some(status) = &patch.status {
            update = update.filter(open_or_same(status));
        }

        let result = update.exec(&self.db).await.map_err(AppError::from)?;
        if result.rows_affected == 0 {
            return Err(match &patch.status {
                Some(status) => self.rejected_write(id, status).await,
                None => AppError::NotFound,
            });
        }

        self.find_model(id).await.map(ServiceRecord::from)
    }

    async fn set_status(&self, id: Uuid, status: ServiceStatus) -> AppResult<ServiceRecord> {
        let result = RecordEntity::update_many()
            .col_expr(
                service_record::Column::Status,
                Expr::value(status.to_string()),
            )
            .col_expr(service_record::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(service_record::Column::Id.eq(id))
            .filter(open_or_same(&status))
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(self.rejected_write(id, &status).await);
        }

        self.find_model(id).await.map(ServiceRecord::from)
    }

    async fn query(&self, scope: ServiceScope) -> AppResult<Vec<(ServiceRecord, Vehicle)>> {
        let mut select = RecordEntity::find();

        match &scope {
            ServiceScope::Owner { owner_user_id, .. } => {
                select = select.filter(service_record::Column::OwnerUserId.eq(*owner_user_id));
            }
            ServiceScope::Operator {
                exclude_statuses, ..
            } => {
                if !exclude_statuses.is_empty() {
                    select = select.filter(
                        service_record::Column::Status
                            .is_not_in(exclude_statuses.iter().map(|s| s.to_string())),
                    );
                }
            }
        }

        if let Some(vehicle_id) = scope.vehicle_id() {
            select = select.filter(service_record::Column::VehicleId.eq(vehicle_id));
        }

        let rows = select
            .find_also_related(VehicleEntity)
            .order_by_desc(service_record::Column::ScheduledDate)
            .order_by_desc(service_record::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(rows
            .into_iter()
            .filter_map(|(record, vehicle)| match vehicle {
                Some(vehicle) => Some((ServiceRecord::from(record), Vehicle::from(vehicle))),
                None => {
                    tracing::debug!(record_id = %record.id, "Skipping orphaned service record");
                    None
                }
            })
            .collect())
    }

    async fn cancel_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
        note: String,
    ) -> AppResult<Vec<ServiceRecord>> {
        let pending = ServiceStatus::Pending.to_string();

        let candidates: Vec<Uuid> = RecordEntity::find()
            .select_only()
            .column(service_record::Column::Id)
            .filter(service_record::Column::Status.eq(pending.as_str()))
            .filter(service_record::Column::ScheduledDate.lte(cutoff))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        let mut cancelled = Vec::with_capacity(candidates.len());
        for id in candidates {
            // Re-check pending in the UPDATE so a concurrent sweep or
            // operator write is never overwritten
            let result = RecordEntity::update_many()
                .col_expr(
                    service_record::Column::Status,
                    Expr::value(ServiceStatus::Cancelled.to_string()),
                )
                .col_expr(
                    service_record::Column::Description,
                    Expr::value(note.clone()),
                )
                .col_expr(service_record::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(service_record::Column::Id.eq(id))
                .filter(service_record::Column::Status.eq(pending.as_str()))
                .exec(&self.db)
                .await
                .map_err(AppError::from)?;

            if result.rows_affected == 1 {
                cancelled.push(id);
            }
        }

        if cancelled.is_empty() {
            return Ok(Vec::new());
        }

        let models = RecordEntity::find()
            .filter(service_record::Column::Id.is_in(cancelled))
            .order_by_asc(service_record::Column::ScheduledDate)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(ServiceRecord::from).collect())
    }
}
