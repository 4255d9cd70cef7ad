//! Migration: Create service_records table.
//!
//! No foreign key to vehicles: a vehicle may be removed after a job was
//! logged against it, and listings drop such orphans at query time.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServiceRecords::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ServiceRecords::OwnerUserId).uuid().not_null())
                    .col(ColumnDef::new(ServiceRecords::VehicleId).uuid().not_null())
                    .col(
                        ColumnDef::new(ServiceRecords::Status)
                            .string_len(64)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(ServiceRecords::ScheduledDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ServiceRecords::Description).text().null())
                    .col(
                        ColumnDef::new(ServiceRecords::EstimatedCost)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(ServiceRecords::CustomerName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceRecords::CustomerContact)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ServiceRecords::PartsUsed).json().not_null())
                    .col(
                        ColumnDef::new(ServiceRecords::TotalBill)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(ServiceRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceRecords::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Sweep lookup: pending records by age
        manager
            .create_index(
                Index::create()
                    .name("idx_service_records_status_scheduled_date")
                    .table(ServiceRecords::Table)
                    .col(ServiceRecords::Status)
                    .col(ServiceRecords::ScheduledDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_service_records_owner_user_id")
                    .table(ServiceRecords::Table)
                    .col(ServiceRecords::OwnerUserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ServiceRecords::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ServiceRecords {
    Table,
    Id,
    OwnerUserId,
    VehicleId,
    Status,
    ScheduledDate,
    Description,
    EstimatedCost,
    CustomerName,
    CustomerContact,
    PartsUsed,
    TotalBill,
    CreatedAt,
    UpdatedAt,
}
