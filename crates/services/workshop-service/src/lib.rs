//! Workshop Service Library
//!
//! Persistence, the service record lifecycle, live events and the
//! auto-cancel sweep. The gateway embeds it; the binary exposes the
//! maintenance commands.

pub mod config;
pub mod events;
pub mod infra;
pub mod repository;
pub mod scheduler;
pub mod service;

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use common::{AppError, DatabaseConfig};
use domain::{User, UserRole};

use crate::config::SweepConfig;
use crate::events::NoopPublisher;
use crate::infra::Database;
use crate::repository::{ServiceRecordStore, UserRepository, UserStore, VehicleStore};
use crate::service::{AutoCancelSweep, RecordAssembler, SweepReport};

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = DatabaseConfig::from_env();
    let db = Database::connect_without_migrations(&config).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}

/// Run a single auto-cancel sweep outside the server. Nobody is subscribed,
/// so cancellations are only logged.
pub async fn run_sweep_once() -> Result<SweepReport, Box<dyn std::error::Error>> {
    let sweep_config = SweepConfig::from_env();
    let db = Database::connect(&DatabaseConfig::from_env()).await?;
    let conn = db.get_connection();

    let users = Arc::new(UserStore::new(conn.clone()));
    let vehicles = Arc::new(VehicleStore::new(conn.clone()));
    let sweep = AutoCancelSweep::new(
        Arc::new(ServiceRecordStore::new(conn)),
        Arc::new(RecordAssembler::new(vehicles, users)),
        Arc::new(NoopPublisher),
        sweep_config.stale_after,
    );

    let report = sweep.run_once(Utc::now()).await?;
    info!(cancelled = report.cancelled, "One-off sweep complete");
    Ok(report)
}

/// Grant the operator role to an existing account.
pub async fn promote_user(email: &str) -> Result<User, Box<dyn std::error::Error>> {
    let db = Database::connect(&DatabaseConfig::from_env()).await?;
    let users = UserStore::new(db.get_connection());

    let user = users
        .find_by_email(&email.trim().to_lowercase())
        .await?
        .ok_or(AppError::NotFound)?;
    let user = users.update_role(user.id, UserRole::Admin).await?;

    info!(user_id = %user.id, "User promoted to operator");
    Ok(user)
}
