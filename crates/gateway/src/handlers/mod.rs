//! HTTP handlers.

pub mod auth_handler;
pub mod events_handler;
pub mod health_handler;
pub mod service_handler;
pub mod vehicle_handler;

pub use auth_handler::{auth_routes, profile_routes};
pub use events_handler::event_routes;
pub use health_handler::health_routes;
pub use service_handler::service_routes;
pub use vehicle_handler::vehicle_routes;
