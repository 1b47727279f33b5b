//! External collaborators the provisioning flow talks to.
//!
//! Identity storage, credential hashing, invitation delivery and the profile
//! table all live in the hosted backend. The flow only sees them through the
//! three capability traits below; [`client::BackendClient`] binds all three to
//! the backend's REST surface.

pub mod client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use client::BackendClient;

/// Errors from backend calls
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend answered and refused the operation
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected backend response: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        BackendError::Rejected {
            status,
            message: message.into(),
        }
    }
}

/// Identity resolved from a caller's bearer token
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CallerIdentity {
    pub id: String,
}

/// The role-bearing columns of a stored profile row
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileRecord {
    #[serde(default)]
    pub is_admin: Option<bool>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Metadata attached to a newly created identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffMetadata {
    pub full_name: String,
    pub role: String,
    pub is_admin: bool,
}

/// Direct account creation with a known password
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub metadata: StaffMetadata,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Invite-by-email request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    pub email: String,
    pub metadata: StaffMetadata,
    pub redirect_to: Option<String>,
}

/// Identity record as returned by the identity service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedIdentity {
    pub id: String,
}

/// Profile row written after the identity exists, keyed by identity id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProfile {
    pub id: String,
    pub full_name: String,
    pub role: String,
    pub is_admin: bool,
}

/// Resolves a bearer token to the identity that owns it.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<CallerIdentity, BackendError>;
}

/// Reads and writes rows in the profiles table.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// `Ok(None)` when no row exists for `id`.
    async fn fetch_profile(&self, id: &str) -> Result<Option<ProfileRecord>, BackendError>;

    /// Insert, or replace on conflict with an existing `id`.
    async fn upsert_profile(&self, profile: &NewProfile) -> Result<(), BackendError>;
}

/// Administrative identity operations.
#[async_trait]
pub trait IdentityAdmin: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> Result<CreatedIdentity, BackendError>;

    async fn invite_user(&self, invitation: &Invitation) -> Result<CreatedIdentity, BackendError>;
}
