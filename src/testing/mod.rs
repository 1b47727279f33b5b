use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::backend::{
    BackendError, CallerIdentity, CreatedIdentity, IdentityAdmin, Invitation, NewProfile, NewUser,
    ProfileRecord, ProfileStore, TokenVerifier,
};
use crate::config::RoleMode;
use crate::provisioning::StaffProvisioner;

pub const ADMIN_TOKEN: &str = "admin-token";
pub const ADMIN_ID: &str = "00000000-0000-0000-0000-00000000a001";
pub const DUPLICATE_EMAIL_MESSAGE: &str = "A user with this email address has already been registered";

/// In-memory stand-in for the identity service and profiles table
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

#[derive(Default)]
pub struct FakeState {
    pub tokens: HashMap<String, String>,
    pub profiles: HashMap<String, ProfileRecord>,
    pub emails: HashSet<String>,
    pub created: Vec<NewUser>,
    pub invited: Vec<Invitation>,
    pub upserted: Vec<NewProfile>,
    pub calls: usize,
    pub fail_profile_reads: bool,
    pub fail_upserts: Option<String>,
}

impl FakeBackend {
    /// Backend that knows one admin caller (`ADMIN_TOKEN` → `ADMIN_ID`)
    pub fn with_admin() -> Arc<Self> {
        let backend = Arc::new(Self::default());
        backend.add_caller(
            ADMIN_TOKEN,
            ADMIN_ID,
            Some(ProfileRecord {
                is_admin: Some(true),
                role: Some("admin".into()),
            }),
        );
        backend
    }

    pub fn add_caller(&self, token: &str, id: &str, profile: Option<ProfileRecord>) {
        let mut state = self.state();
        state.tokens.insert(token.to_string(), id.to_string());
        match profile {
            Some(p) => {
                state.profiles.insert(id.to_string(), p);
            }
            None => {
                state.profiles.remove(id);
            }
        }
    }

    pub fn fail_profile_reads(&self) {
        self.state().fail_profile_reads = true;
    }

    pub fn fail_upserts(&self, message: &str) {
        self.state().fail_upserts = Some(message.to_string());
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake backend lock poisoned")
    }

    pub fn provisioner(self: &Arc<Self>, mode: RoleMode) -> StaffProvisioner {
        StaffProvisioner::new(self.clone(), self.clone(), self.clone(), mode)
    }

    fn register(&self, email: &str) -> Result<CreatedIdentity, BackendError> {
        let mut state = self.state();
        if !state.emails.insert(email.to_lowercase()) {
            return Err(BackendError::rejected(422, DUPLICATE_EMAIL_MESSAGE));
        }
        Ok(CreatedIdentity {
            id: Uuid::new_v4().to_string(),
        })
    }
}

#[async_trait]
impl TokenVerifier for FakeBackend {
    async fn verify_token(&self, token: &str) -> Result<CallerIdentity, BackendError> {
        let mut state = self.state();
        state.calls += 1;
        state
            .tokens
            .get(token)
            .map(|id| CallerIdentity { id: id.clone() })
            .ok_or_else(|| BackendError::rejected(401, "invalid JWT: token is expired"))
    }
}

#[async_trait]
impl ProfileStore for FakeBackend {
    async fn fetch_profile(&self, id: &str) -> Result<Option<ProfileRecord>, BackendError> {
        let mut state = self.state();
        state.calls += 1;
        if state.fail_profile_reads {
            return Err(BackendError::rejected(500, "relation \"profiles\" does not exist"));
        }
        Ok(state.profiles.get(id).cloned())
    }

    async fn upsert_profile(&self, profile: &NewProfile) -> Result<(), BackendError> {
        let mut state = self.state();
        state.calls += 1;
        if let Some(message) = &state.fail_upserts {
            return Err(BackendError::rejected(409, message.clone()));
        }
        state.profiles.insert(
            profile.id.clone(),
            ProfileRecord {
                is_admin: Some(profile.is_admin),
                role: Some(profile.role.clone()),
            },
        );
        state.upserted.push(profile.clone());
        Ok(())
    }
}

#[async_trait]
impl IdentityAdmin for FakeBackend {
    async fn create_user(&self, user: &NewUser) -> Result<CreatedIdentity, BackendError> {
        self.state().calls += 1;
        let identity = self.register(&user.email)?;
        self.state().created.push(user.clone());
        Ok(identity)
    }

    async fn invite_user(&self, invitation: &Invitation) -> Result<CreatedIdentity, BackendError> {
        self.state().calls += 1;
        let identity = self.register(&invitation.email)?;
        self.state().invited.push(invitation.clone());
        Ok(identity)
    }
}
