//! Service record database entity.

use sea_orm::entity::prelude::*;

use domain::{Part, ServiceRecord, ServiceStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "service_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub vehicle_id: Uuid,
    pub status: String,
    pub scheduled_date: DateTimeUtc,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub estimated_cost: f64,
    pub customer_name: String,
    pub customer_contact: String,
    pub parts_used: Json,
    pub total_bill: f64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vehicle::Entity",
        from = "Column::VehicleId",
        to = "super::vehicle::Column::Id"
    )]
    Vehicle,
}

impl Related<super::vehicle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicle.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Serialize a parts list for the JSON column.
pub fn parts_to_json(parts: &[Part]) -> Json {
    serde_json::to_value(parts).unwrap_or_else(|_| Json::Array(Vec::new()))
}

impl From<Model> for ServiceRecord {
    fn from(model: Model) -> Self {
        // Rows written by older clients may hold malformed part entries
        let parts_used: Vec<Part> = serde_json::from_value(model.parts_used).unwrap_or_else(|e| {
            tracing::warn!(record_id = %model.id, error = %e, "Unreadable partsUsed, loading as empty");
            Vec::new()
        });

        ServiceRecord {
            id: model.id,
            owner_user_id: model.owner_user_id,
            vehicle_id: model.vehicle_id,
            status: ServiceStatus::from(model.status),
            scheduled_date: model.scheduled_date,
            description: model.description,
            estimated_cost: model.estimated_cost,
            customer_name: model.customer_name,
            customer_contact: model.customer_contact,
            parts_used,
            total_bill: model.total_bill,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
