use serde::Deserialize;
use serde_json::Value;

use crate::config::RoleMode;
use crate::error::ApiError;

/// Role given to every account created in strict mode, and the permissive default.
pub const STAFF_ROLE: &str = "staff";

/// Raw request body. Unknown fields are ignored.
///
/// Only `email` and `full_name` are typed up front. The rest depend on the
/// role mode and are type-checked in `validate`, so strict mode can ignore them.
#[derive(Default, Deserialize)]
pub struct ProvisionStaffRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub password: Option<Value>,
    #[serde(default)]
    pub role: Option<Value>,
    #[serde(default)]
    pub is_admin: Option<Value>,
    #[serde(default)]
    pub send_invite: Option<Value>,
}

/// How the new identity gets created
#[derive(Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Create with a password; `supplied` is whatever the caller sent, unvetted.
    Direct { supplied: Option<String> },
    /// Email an invitation link instead of issuing a password.
    Invite,
}

impl std::fmt::Debug for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Direct { supplied } => f
                .debug_struct("Direct")
                .field("supplied", &supplied.as_ref().map(|_| "<redacted>"))
                .finish(),
            Strategy::Invite => f.write_str("Invite"),
        }
    }
}

/// Validated provisioning command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionCommand {
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub is_admin: bool,
    pub strategy: Strategy,
}

impl ProvisionCommand {
    /// Parse and validate a raw JSON body
    pub fn from_body(body: &[u8], mode: RoleMode) -> Result<Self, ApiError> {
        let request: ProvisionStaffRequest = serde_json::from_slice(body)
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))?;
        Self::validate(request, mode)
    }

    pub fn validate(request: ProvisionStaffRequest, mode: RoleMode) -> Result<Self, ApiError> {
        let email = required(request.email, "email")?;
        let full_name = required(request.full_name, "full_name")?;

        match mode {
            RoleMode::Strict => Ok(Self {
                email,
                full_name,
                role: STAFF_ROLE.to_string(),
                is_admin: false,
                // a non-string password counts as absent and one is generated
                strategy: Strategy::Direct {
                    supplied: request
                        .password
                        .and_then(|p| p.as_str().map(str::to_string)),
                },
            }),
            RoleMode::Permissive => {
                let role = optional_string(request.role, "role")?
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| STAFF_ROLE.to_string());
                let is_admin = optional_bool(request.is_admin, "is_admin")?.unwrap_or(false);
                let send_invite = optional_bool(request.send_invite, "send_invite")?.unwrap_or(true);
                let password = optional_string(request.password, "password")?;

                let strategy = if send_invite {
                    Strategy::Invite
                } else {
                    let password = password.filter(|p| !p.trim().is_empty()).ok_or_else(
                        || ApiError::bad_request("password is required when send_invite is false"),
                    )?;
                    Strategy::Direct {
                        supplied: Some(password),
                    }
                };

                Ok(Self {
                    email,
                    full_name,
                    role,
                    is_admin,
                    strategy,
                })
            }
        }
    }
}

fn optional_string(value: Option<Value>, field: &str) -> Result<Option<String>, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(ApiError::bad_request(format!("{} must be a string", field))),
    }
}

fn optional_bool(value: Option<Value>, field: &str) -> Result<Option<bool>, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(_) => Err(ApiError::bad_request(format!("{} must be a boolean", field))),
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("{} is required", field)))
}
