//! SeaORM entities.

pub mod service_record;
pub mod user;
pub mod vehicle;
