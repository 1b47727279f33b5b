// handlers/staff.rs - POST / and POST /provision-staff

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::HeaderMap,
};

use crate::api::{ApiResponse, ApiResult};
use crate::app::AppState;
use crate::auth::bearer_token;
use crate::error::ApiError;
use crate::provisioning::ProvisionedStaff;

/**
 * POST /provision-staff - Create a staff account on behalf of an administrator
 *
 * Expected Input:
 * ```json
 * {
 *   "email": "string",        // Required
 *   "full_name": "string",    // Required
 *   "password": "string",     // Optional; used only if >= 8 chars after trim
 *   "role": "string",         // Permissive mode only, default "staff"
 *   "is_admin": false,        // Permissive mode only
 *   "send_invite": true       // Permissive mode only, default true
 * }
 * ```
 *
 * Requires `Authorization: Bearer <token>` belonging to an admin profile.
 */
pub async fn provision_staff(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<ProvisionedStaff> {
    let provisioner = state.provisioner()?;

    let body = body.map_err(|e| {
        tracing::warn!("Unreadable request body: {}", e);
        ApiError::bad_request(format!("Unreadable request body: {}", e))
    })?;

    let staff = provisioner.provision(bearer_token(&headers), &body).await?;
    Ok(ApiResponse::success(staff))
}

/// Any method other than POST on the provisioning routes
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
