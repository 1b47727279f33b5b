use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, Instrument};
use uuid::Uuid;

use super::password::resolve_password;
use super::request::{ProvisionCommand, Strategy};
use crate::auth::{authenticate, authorize};
use crate::backend::{
    BackendClient, IdentityAdmin, Invitation, NewProfile, NewUser, ProfileStore, StaffMetadata,
    TokenVerifier,
};
use crate::config::RoleMode;
use crate::error::ApiError;

/// Success payload returned to the calling administrator
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedStaff {
    pub ok: bool,
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub is_admin: bool,
    pub invited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl std::fmt::Debug for ProvisionedStaff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionedStaff")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("is_admin", &self.is_admin)
            .field("invited", &self.invited)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Authenticates, authorizes and provisions one staff account per call.
///
/// Holds no mutable state; one instance is shared by every request.
#[derive(Clone)]
pub struct StaffProvisioner {
    verifier: Arc<dyn TokenVerifier>,
    profiles: Arc<dyn ProfileStore>,
    identity: Arc<dyn IdentityAdmin>,
    mode: RoleMode,
    invite_redirect_to: Option<String>,
}

impl StaffProvisioner {
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        profiles: Arc<dyn ProfileStore>,
        identity: Arc<dyn IdentityAdmin>,
        mode: RoleMode,
    ) -> Self {
        Self {
            verifier,
            profiles,
            identity,
            mode,
            invite_redirect_to: None,
        }
    }

    /// Bind every collaborator to one backend client
    pub fn from_client(client: BackendClient, mode: RoleMode) -> Self {
        let redirect = client.config().invite_redirect_to.clone();
        let client = Arc::new(client);
        Self::new(client.clone(), client.clone(), client, mode).with_invite_redirect(redirect)
    }

    pub fn with_invite_redirect(mut self, redirect_to: Option<String>) -> Self {
        self.invite_redirect_to = redirect_to;
        self
    }

    pub fn mode(&self) -> RoleMode {
        self.mode
    }

    /// Run the whole flow for one request body.
    ///
    /// `token` is the already-extracted bearer token, or the error explaining
    /// why the Authorization header was unusable. The body is validated first
    /// so malformed requests never reach the backend.
    pub async fn provision(
        &self,
        token: Result<String, ApiError>,
        body: &[u8],
    ) -> Result<ProvisionedStaff, ApiError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("provision_staff", %request_id, mode = ?self.mode);

        async move {
            let command = ProvisionCommand::from_body(body, self.mode)?;
            let token = token?;

            let caller_id = authenticate(self.verifier.as_ref(), &token).await?;
            let caller = authorize(self.profiles.as_ref(), &caller_id).await?;
            info!(
                "Admin {} provisioning {} as '{}' ({:?})",
                caller.id, command.email, command.role, command.strategy
            );

            self.execute(command).await
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, command: ProvisionCommand) -> Result<ProvisionedStaff, ApiError> {
        let metadata = StaffMetadata {
            full_name: command.full_name.clone(),
            role: command.role.clone(),
            is_admin: command.is_admin,
        };

        let (identity, password, invited) = match command.strategy {
            Strategy::Direct { supplied } => {
                let password = resolve_password(supplied.as_deref());
                let user = NewUser {
                    email: command.email.clone(),
                    password: password.as_str().to_string(),
                    metadata,
                };
                let identity = self.identity.create_user(&user).await.map_err(|e| {
                    error!("Identity creation failed for {}: {}", command.email, e);
                    ApiError::from(e)
                })?;
                info!(
                    "Created identity {} for {} (generated password: {})",
                    identity.id,
                    command.email,
                    password.is_generated()
                );
                (identity, Some(password.into_string()), false)
            }
            Strategy::Invite => {
                let invitation = Invitation {
                    email: command.email.clone(),
                    metadata,
                    redirect_to: self.invite_redirect_to.clone(),
                };
                let identity = self.identity.invite_user(&invitation).await.map_err(|e| {
                    error!("Invitation failed for {}: {}", command.email, e);
                    ApiError::from(e)
                })?;
                info!("Invited {} as identity {}", command.email, identity.id);
                (identity, None, true)
            }
        };

        let profile = NewProfile {
            id: identity.id.clone(),
            full_name: command.full_name.clone(),
            role: command.role.clone(),
            is_admin: command.is_admin,
        };

        // No compensation: the identity stays and the admin reconciles by hand.
        if let Err(e) = self.profiles.upsert_profile(&profile).await {
            error!(
                "Identity {} ({}) created but profile upsert failed: {}",
                identity.id, command.email, e
            );
            return Err(ApiError::upstream(format!(
                "User was created (id {}) but saving the profile failed: {}. \
                 The account needs manual reconciliation.",
                identity.id, e
            )));
        }

        Ok(ProvisionedStaff {
            ok: true,
            id: identity.id,
            email: command.email,
            full_name: command.full_name,
            role: command.role,
            is_admin: command.is_admin,
            invited,
            password,
        })
    }
}
