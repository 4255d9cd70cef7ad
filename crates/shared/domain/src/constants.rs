//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// User Roles
// =============================================================================

/// Default role assigned to new users
pub const ROLE_USER: &str = "user";

/// Operator role, allowed to assign and update any service record
pub const ROLE_ADMIN: &str = "admin";

/// All valid role values
pub const VALID_ROLES: &[&str] = &[ROLE_USER, ROLE_ADMIN];

/// Check if a role value is valid
pub fn is_valid_role(role: &str) -> bool {
    VALID_ROLES.contains(&role)
}

// =============================================================================
// Validation
// =============================================================================

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum name length requirement
pub const MIN_NAME_LENGTH: usize = 1;

/// Earliest model year accepted for a self-registered vehicle
pub const MIN_VEHICLE_YEAR: i32 = 1886;

// =============================================================================
// Authentication
// =============================================================================

/// Default JWT token expiration in hours
pub const DEFAULT_JWT_EXPIRATION_HOURS: i64 = 24;

/// Minimum JWT secret length (security requirement)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Seconds per hour (for token expiration calculation)
pub const SECONDS_PER_HOUR: i64 = 3600;

/// Authorization header prefix for Bearer tokens
pub const BEARER_TOKEN_PREFIX: &str = "Bearer ";

/// Header carrying a raw token, kept for older web clients
pub const LEGACY_TOKEN_HEADER: &str = "x-auth-token";

/// JWT token type identifier
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

// =============================================================================
// Service Records
// =============================================================================

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_IN_PROGRESS: &str = "in-progress";
pub const STATUS_READY_FOR_PICKUP: &str = "ready-for-pickup";
pub const STATUS_PICKED_UP: &str = "picked-up";
pub const STATUS_CANCELLED: &str = "cancelled";

/// Free-text service types written by earlier clients into the status column.
/// Still accepted on write so those clients keep working.
pub const LEGACY_SERVICE_TYPES: &[&str] = &[
    "Oil Change",
    "Tire Rotation",
    "Brake Inspection",
    "Engine Diagnostic",
    "Fluid Check",
    "Other",
];

/// Customer name recorded when the identity store cannot be reached
pub const UNKNOWN_CUSTOMER_NAME: &str = "Unknown User";

/// Customer contact recorded when the identity store cannot be reached
pub const UNKNOWN_CUSTOMER_CONTACT: &str = "N/A";

/// Description written onto records cancelled by the sweep
pub const AUTO_CANCEL_NOTE: &str = "Automatically cancelled due to no action within 24 hours.";

/// Age after which a pending record is considered stale
pub const DEFAULT_STALE_AFTER_HOURS: i64 = 24;

/// Period between two auto-cancel sweeps
pub const DEFAULT_SWEEP_INTERVAL_MINUTES: u64 = 60;

// =============================================================================
// Events
// =============================================================================

/// Topic name of the record snapshot pushed to live subscribers
pub const SERVICE_UPDATE_EVENT: &str = "serviceUpdate";
