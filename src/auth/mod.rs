use axum::http::{header, HeaderMap};
use tracing::warn;

use crate::backend::{ProfileRecord, ProfileStore, TokenVerifier};
use crate::error::ApiError;

/// Authenticated caller with the role data read from their profile
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
    pub is_admin: bool,
    pub role: String,
}

impl Caller {
    pub fn from_profile(id: String, profile: Option<ProfileRecord>) -> Self {
        let profile = profile.unwrap_or_default();
        Self {
            id,
            is_admin: profile.is_admin.unwrap_or(false),
            role: profile.role.unwrap_or_default(),
        }
    }

    /// Admin flag set, or role equal to "admin" ignoring case.
    pub fn is_authorized_admin(&self) -> bool {
        self.is_admin || self.role.trim().eq_ignore_ascii_case("admin")
    }
}

/// Extract the bearer token from the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?;

    let (scheme, token) = auth_str
        .trim()
        .split_once(' ')
        .ok_or_else(|| ApiError::unauthorized("Authorization header must use Bearer token format"))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ApiError::unauthorized(
            "Authorization header must use Bearer token format",
        ));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::unauthorized("Empty bearer token"));
    }

    Ok(token.to_string())
}

/// Resolve the caller's token to an identity id
pub async fn authenticate(verifier: &dyn TokenVerifier, token: &str) -> Result<String, ApiError> {
    match verifier.verify_token(token).await {
        Ok(identity) => Ok(identity.id),
        Err(e) => {
            warn!("Caller token rejected: {}", e);
            Err(ApiError::unauthorized("Invalid or expired token"))
        }
    }
}

/// Load the caller's profile and require the admin predicate
pub async fn authorize(profiles: &dyn ProfileStore, caller_id: &str) -> Result<Caller, ApiError> {
    let profile = profiles.fetch_profile(caller_id).await.map_err(|e| {
        tracing::error!("Failed to read profile for caller {}: {}", caller_id, e);
        ApiError::internal_server_error("Failed to read caller profile")
    })?;

    if profile.is_none() {
        warn!("Caller {} has no profile row; treating as non-admin", caller_id);
    }

    let caller = Caller::from_profile(caller_id.to_string(), profile);
    if !caller.is_authorized_admin() {
        warn!("Caller {} is not an admin (role '{}')", caller.id, caller.role);
        return Err(ApiError::forbidden("Only administrators can create staff accounts"));
    }

    Ok(caller)
}
