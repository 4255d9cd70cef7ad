//! Vehicle database entity.

use sea_orm::entity::prelude::*;

use domain::Vehicle;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "vehicles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub make: String,
    pub model: String,
    pub year: Option<i32>,
    #[sea_orm(unique)]
    pub license_plate: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::service_record::Entity")]
    ServiceRecord,
}

impl Related<super::service_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceRecord.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Vehicle {
    fn from(model: Model) -> Self {
        Vehicle {
            id: model.id,
            owner_user_id: model.owner_user_id,
            make: model.make,
            model: model.model,
            year: model.year,
            license_plate: model.license_plate,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
