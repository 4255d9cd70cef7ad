//! Workshop Service - maintenance commands for the workshop database.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use workshop_service_lib::MigrateAction;

#[derive(Parser)]
#[command(name = "workshop-service")]
#[command(about = "Workshop database maintenance")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database migration commands
    Migrate {
        #[command(subcommand)]
        action: MigrateCommands,
    },
    /// Cancel stale pending service records once
    Sweep,
    /// User administration
    Users {
        #[command(subcommand)]
        action: UserCommands,
    },
}

#[derive(Subcommand)]
enum MigrateCommands {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset database and run all migrations
    Fresh,
}

#[derive(Subcommand)]
enum UserCommands {
    /// Give an account the operator (admin) role
    Promote { email: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate { action } => {
            let migrate_action = match action {
                MigrateCommands::Up => MigrateAction::Up,
                MigrateCommands::Down => MigrateAction::Down,
                MigrateCommands::Status => MigrateAction::Status,
                MigrateCommands::Fresh => MigrateAction::Fresh,
            };
            workshop_service_lib::run_migrations(migrate_action).await?;
        }
        Commands::Sweep => {
            let report = workshop_service_lib::run_sweep_once().await?;
            println!("Cancelled {} stale service record(s)", report.cancelled);
        }
        Commands::Users {
            action: UserCommands::Promote { email },
        } => {
            let user = workshop_service_lib::promote_user(&email).await?;
            println!("{} is now an operator", user.email);
        }
    }

    Ok(())
}
