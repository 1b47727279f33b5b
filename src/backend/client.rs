use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use super::{
    BackendError, CallerIdentity, CreatedIdentity, IdentityAdmin, Invitation, NewProfile, NewUser,
    ProfileRecord, ProfileStore, TokenVerifier,
};
use crate::config::BackendConfig;

const PROFILES_TABLE: &str = "rest/v1/profiles";

/// REST client for the hosted auth (`/auth/v1`) and data (`/rest/v1`) APIs
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    config: BackendConfig,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Attach the privileged service key
    fn as_service(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.service_role_key)
            .bearer_auth(&self.config.service_role_key)
    }
}

/// Pass successful responses through, turn everything else into `Rejected`
async fn ensure_success(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(BackendError::rejected(
        status.as_u16(),
        rejection_message(status.as_u16(), &body),
    ))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Pull a human-readable message out of an auth or data API error body.
///
/// The auth API uses `msg`, `error_description` or `error`; the data API uses
/// `message`. Falls back to the raw body, then to the status code.
pub(crate) fn rejection_message(status: u16, body: &str) -> String {
    if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(body) {
        for key in ["msg", "message", "error_description", "error"] {
            if let Some(Value::String(text)) = obj.get(key) {
                if !text.trim().is_empty() {
                    return text.clone();
                }
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("Backend returned HTTP {}", status)
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl TokenVerifier for BackendClient {
    async fn verify_token(&self, token: &str) -> Result<CallerIdentity, BackendError> {
        let url = self.config.endpoint("auth/v1/user");
        debug!("Verifying caller token against {}", url);

        let response = self
            .http
            .get(url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        read_json(response).await
    }
}

#[async_trait]
impl ProfileStore for BackendClient {
    async fn fetch_profile(&self, id: &str) -> Result<Option<ProfileRecord>, BackendError> {
        let mut url = self.config.endpoint(PROFILES_TABLE);
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{}", id))
            .append_pair("select", "is_admin,role")
            .append_pair("limit", "1");

        let response = self.as_service(self.http.get(url)).send().await?;
        let rows: Vec<ProfileRecord> = read_json(response).await?;
        Ok(rows.into_iter().next())
    }

    async fn upsert_profile(&self, profile: &NewProfile) -> Result<(), BackendError> {
        let mut url = self.config.endpoint(PROFILES_TABLE);
        url.query_pairs_mut().append_pair("on_conflict", "id");

        let response = self
            .as_service(self.http.post(url))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[profile])
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityAdmin for BackendClient {
    async fn create_user(&self, user: &NewUser) -> Result<CreatedIdentity, BackendError> {
        let url = self.config.endpoint("auth/v1/admin/users");
        let body = json!({
            "email": user.email,
            "password": user.password,
            "email_confirm": true,
            "user_metadata": user.metadata,
        });

        let response = self.as_service(self.http.post(url)).json(&body).send().await?;
        read_json(response).await
    }

    async fn invite_user(&self, invitation: &Invitation) -> Result<CreatedIdentity, BackendError> {
        let mut url = self.config.endpoint("auth/v1/invite");
        if let Some(redirect_to) = &invitation.redirect_to {
            url.query_pairs_mut().append_pair("redirect_to", redirect_to);
        }
        let body = json!({
            "email": invitation.email,
            "data": invitation.metadata,
        });

        let response = self.as_service(self.http.post(url)).json(&body).send().await?;
        read_json(response).await
    }
}
