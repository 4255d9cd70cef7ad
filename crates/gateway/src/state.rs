//! Application state for dependency injection.

use std::sync::Arc;

use workshop_service_lib::events::BroadcastHub;
use workshop_service_lib::infra::Database;
use workshop_service_lib::service::{
    AuthService, ServiceRecordService, VehicleService, WorkshopServices,
};

use crate::config::GatewayConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: WorkshopServices,
    pub hub: BroadcastHub,
    pub db: Database,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    /// Create new app state.
    pub fn new(
        services: WorkshopServices,
        hub: BroadcastHub,
        db: Database,
        config: GatewayConfig,
    ) -> Self {
        Self {
            services,
            hub,
            db,
            config: Arc::new(config),
        }
    }

    pub fn auth(&self) -> Arc<dyn AuthService> {
        self.services.auth()
    }

    pub fn vehicles(&self) -> Arc<dyn VehicleService> {
        self.services.vehicles()
    }

    pub fn records(&self) -> Arc<dyn ServiceRecordService> {
        self.services.records()
    }
}
