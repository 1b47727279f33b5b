// handlers/mod.rs - HTTP handlers
//
// staff  → POST /, POST /provision-staff (admin bearer token required)
// health → GET /health (public)

pub mod health;
pub mod staff;

pub use health::health;
pub use staff::{method_not_allowed, provision_staff};
