//! Staff account provisioning: request validation, password policy and the
//! authenticate → authorize → create → upsert flow.

pub mod password;
pub mod request;
pub mod service;

pub use password::{generate_password, resolve_password, ResolvedPassword};
pub use request::{ProvisionCommand, ProvisionStaffRequest, Strategy, STAFF_ROLE};
pub use service::{ProvisionedStaff, StaffProvisioner};
