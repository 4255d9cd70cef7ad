//! Service container - wires stores, core services and the publisher.

use std::sync::Arc;

use common::JwtConfig;
use sea_orm::DatabaseConnection;

use super::{
    AuthService, AutoCancelSweep, Authenticator, OwnershipResolver, RecordAssembler, ServiceDesk,
    ServiceRecordService, VehicleManager, VehicleService,
};
use crate::config::SweepConfig;
use crate::events::EventPublisher;
use crate::repository::{ServiceRecordStore, UserStore, VehicleStore};

/// Centralized access to the workshop services.
#[derive(Clone)]
pub struct WorkshopServices {
    auth: Arc<dyn AuthService>,
    vehicles: Arc<dyn VehicleService>,
    records: Arc<dyn ServiceRecordService>,
    sweep: Arc<AutoCancelSweep>,
}

impl WorkshopServices {
    /// Build every service on one database connection. All record changes
    /// go to `publisher`.
    pub fn from_connection(
        db: DatabaseConnection,
        jwt: JwtConfig,
        sweep: &SweepConfig,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        let users = Arc::new(UserStore::new(db.clone()));
        let vehicle_store = Arc::new(VehicleStore::new(db.clone()));
        let record_store = Arc::new(ServiceRecordStore::new(db));

        let assembler = Arc::new(RecordAssembler::new(vehicle_store.clone(), users.clone()));
        let resolver = OwnershipResolver::new(vehicle_store.clone(), users.clone());

        let records = Arc::new(ServiceDesk::new(
            record_store.clone(),
            vehicle_store.clone(),
            resolver,
            assembler.clone(),
            publisher.clone(),
        ));
        let sweep = Arc::new(AutoCancelSweep::new(
            record_store,
            assembler,
            publisher,
            sweep.stale_after,
        ));

        Self {
            auth: Arc::new(Authenticator::new(users, jwt)),
            vehicles: Arc::new(VehicleManager::new(vehicle_store)),
            records,
            sweep,
        }
    }

    pub fn auth(&self) -> Arc<dyn AuthService> {
        self.auth.clone()
    }

    pub fn vehicles(&self) -> Arc<dyn VehicleService> {
        self.vehicles.clone()
    }

    pub fn records(&self) -> Arc<dyn ServiceRecordService> {
        self.records.clone()
    }

    pub fn sweep(&self) -> Arc<AutoCancelSweep> {
        self.sweep.clone()
    }
}
