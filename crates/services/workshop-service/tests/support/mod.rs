//! Shared fixtures: an in-memory SQLite database with the real schema.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use common::DatabaseConfig;
use domain::{
    NewServiceRecord, NewUser, NewVehicle, ServiceRecord, ServiceStatus, User, UserRole, Vehicle,
};
use uuid::Uuid;
use workshop_service_lib::events::{EventPublisher, ServiceEvent};
use workshop_service_lib::infra::Database;
use workshop_service_lib::repository::{
    IdentityStore, ServiceRecordRepository, ServiceRecordStore, UserRepository, UserStore,
    VehicleRepository, VehicleStore,
};
use workshop_service_lib::service::{
    AutoCancelSweep, OwnershipResolver, RecordAssembler, Requester, ServiceDesk,
};

/// Publisher that keeps every event for inspection.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<ServiceEvent>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<ServiceEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: ServiceEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct TestContext {
    pub db: Database,
    pub users: Arc<UserStore>,
    pub vehicles: Arc<VehicleStore>,
    pub records: Arc<ServiceRecordStore>,
    pub publisher: Arc<RecordingPublisher>,
    pub desk: ServiceDesk,
    pub sweep: AutoCancelSweep,
}

pub async fn setup() -> TestContext {
    // One pooled connection keeps the in-memory database alive and shared
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
    };
    let db = Database::connect(&config).await.expect("sqlite database");
    let conn = db.get_connection();

    let users = Arc::new(UserStore::new(conn.clone()));
    let vehicles = Arc::new(VehicleStore::new(conn.clone()));
    let records = Arc::new(ServiceRecordStore::new(conn));
    let publisher = Arc::new(RecordingPublisher::default());
    let assembler = Arc::new(RecordAssembler::new(vehicles.clone(), users.clone()));

    let desk = ServiceDesk::new(
        records.clone(),
        vehicles.clone(),
        OwnershipResolver::new(vehicles.clone(), users.clone()),
        assembler.clone(),
        publisher.clone(),
    );
    let sweep = AutoCancelSweep::new(
        records.clone(),
        assembler,
        publisher.clone(),
        chrono::Duration::hours(24),
    );

    TestContext {
        db,
        users,
        vehicles,
        records,
        publisher,
        desk,
        sweep,
    }
}

impl TestContext {
    /// A desk over this database with the record store or identity store
    /// swapped out. Publishes to the shared recording publisher.
    pub fn desk_with(
        &self,
        records: Arc<dyn ServiceRecordRepository>,
        identities: Arc<dyn IdentityStore>,
    ) -> ServiceDesk {
        ServiceDesk::new(
            records,
            self.vehicles.clone(),
            OwnershipResolver::new(self.vehicles.clone(), identities.clone()),
            Arc::new(RecordAssembler::new(self.vehicles.clone(), identities)),
            self.publisher.clone(),
        )
    }

    pub async fn user(&self, name: &str, phone: Option<&str>) -> User {
        self.users
            .create(NewUser {
                email: format!("{}@example.com", name.to_lowercase()),
                password_hash: "not-a-real-hash".to_string(),
                name: name.to_string(),
                phone: phone.map(str::to_string),
            })
            .await
            .unwrap()
    }

    pub async fn operator(&self, name: &str) -> User {
        let user = self.user(name, None).await;
        self.users.update_role(user.id, UserRole::Admin).await.unwrap()
    }

    pub async fn vehicle(&self, owner: &User, plate: &str) -> Vehicle {
        self.vehicles
            .create(NewVehicle::new(owner.id, "Honda", "Civic", Some(2018), plate))
            .await
            .unwrap()
    }

    /// Insert a record directly through the store.
    pub async fn record(
        &self,
        vehicle: &Vehicle,
        status: ServiceStatus,
        scheduled_date: DateTime<Utc>,
    ) -> ServiceRecord {
        self.records
            .create(NewServiceRecord {
                owner_user_id: vehicle.owner_user_id,
                vehicle_id: vehicle.id,
                status,
                scheduled_date,
                description: Some("Customer reports squeaky brakes".to_string()),
                estimated_cost: 120.0,
                customer_name: "Jane".to_string(),
                customer_contact: "555-0100".to_string(),
                parts_used: Vec::new(),
                total_bill: 0.0,
            })
            .await
            .unwrap()
    }
}

pub fn requester(user: &User) -> Requester {
    Requester {
        id: user.id,
        is_operator: user.is_admin(),
    }
}

pub fn unknown_id() -> Uuid {
    Uuid::new_v4()
}
