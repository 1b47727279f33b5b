#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use staff_provisioning::app::{router, AppState};
use staff_provisioning::config::{AppConfig, BackendConfig, RoleMode};

pub const ANON_KEY: &str = "anon-key";
pub const SERVICE_KEY: &str = "service-key";
pub const ADMIN_TOKEN: &str = "admin-token";
pub const STAFF_TOKEN: &str = "staff-token";
pub const REDIRECT_TO: &str = "https://app.example.com/welcome";

/// What the fake backend has seen and stored
#[derive(Default)]
pub struct BackendState {
    pub tokens: HashMap<String, String>,
    pub profiles: HashMap<String, Value>,
    pub emails: HashSet<String>,
    pub created_users: Vec<Value>,
    pub invites: Vec<(Value, Option<String>)>,
    pub upserts: Vec<Value>,
    pub fail_upserts: bool,
    pub next_id: u32,
}

pub type SharedBackend = Arc<Mutex<BackendState>>;

pub struct Harness {
    pub base_url: String,
    pub backend: SharedBackend,
    pub client: reqwest::Client,
}

impl Harness {
    pub async fn start(mode: RoleMode) -> Result<Self> {
        let backend: SharedBackend = Arc::new(Mutex::new(BackendState::default()));
        {
            let mut state = backend.lock().unwrap();
            state.tokens.insert(ADMIN_TOKEN.into(), "admin-id".into());
            state.tokens.insert(STAFF_TOKEN.into(), "staff-id".into());
            state
                .profiles
                .insert("admin-id".into(), json!({ "is_admin": false, "role": "Admin" }));
            state
                .profiles
                .insert("staff-id".into(), json!({ "is_admin": false, "role": "staff" }));
        }

        let backend_url = serve(fake_backend(backend.clone())).await?;

        let backend_config = BackendConfig::from_vars(|name| match name {
            "SUPABASE_URL" => Some(backend_url.clone()),
            "SUPABASE_ANON_KEY" => Some(ANON_KEY.to_string()),
            "SUPABASE_SERVICE_ROLE_KEY" => Some(SERVICE_KEY.to_string()),
            "INVITE_REDIRECT_TO" => Some(REDIRECT_TO.to_string()),
            _ => None,
        })
        .context("fake backend config")?;

        let mut config = AppConfig::from_env();
        config.provisioning.role_mode = mode;
        config.api.enable_request_logging = false;

        let app = router(AppState::from_config(&config, Ok(backend_config)), &config);
        let base_url = serve(app).await?;

        Ok(Self {
            base_url,
            backend,
            client: reqwest::Client::new(),
        })
    }

    pub async fn provision(&self, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        let mut request = self
            .client
            .post(format!("{}/provision-staff", self.base_url))
            .json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = StatusCode::from_u16(response.status().as_u16())?;
        let cache_control = response
            .headers()
            .get("cache-control")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        anyhow::ensure!(
            cache_control.as_deref() == Some("no-store"),
            "missing no-store header: {:?}",
            cache_control
        );
        Ok((status, response.json().await?))
    }
}

/// Serve a router on a free local port and return its base URL
async fn serve(app: Router) -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://127.0.0.1:{}", port))
}

fn fake_backend(state: SharedBackend) -> Router {
    Router::new()
        .route("/auth/v1/user", get(get_user))
        .route("/auth/v1/admin/users", post(create_user))
        .route("/auth/v1/invite", post(invite_user))
        .route("/rest/v1/profiles", get(select_profiles).post(upsert_profiles))
        .with_state(state)
}

fn has_key(headers: &HeaderMap, key: &str) -> bool {
    headers.get("apikey").and_then(|v| v.to_str().ok()) == Some(key)
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn service_only(headers: &HeaderMap) -> Option<Response> {
    if has_key(headers, SERVICE_KEY) && bearer(headers).as_deref() == Some(SERVICE_KEY) {
        None
    } else {
        Some((StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid API key" }))).into_response())
    }
}

async fn get_user(State(state): State<SharedBackend>, headers: HeaderMap) -> Response {
    if !has_key(&headers, ANON_KEY) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid API key" }))).into_response();
    }
    let state = state.lock().unwrap();
    match bearer(&headers).and_then(|t| state.tokens.get(&t).cloned()) {
        Some(id) => Json(json!({ "id": id, "email": format!("{}@example.com", id) })).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "code": 401, "msg": "invalid JWT: token is expired" })),
        )
            .into_response(),
    }
}

fn register(state: &mut BackendState, email: &str) -> Result<Value, Response> {
    if !state.emails.insert(email.to_lowercase()) {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "code": 422,
                "msg": "A user with this email address has already been registered"
            })),
        )
            .into_response());
    }
    state.next_id += 1;
    Ok(json!({
        "id": format!("00000000-0000-0000-0000-{:012}", state.next_id),
        "email": email,
        "aud": "authenticated"
    }))
}

async fn create_user(
    State(state): State<SharedBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(denied) = service_only(&headers) {
        return denied;
    }
    let mut state = state.lock().unwrap();
    let email = body["email"].as_str().unwrap_or_default().to_string();
    match register(&mut state, &email) {
        Ok(user) => {
            state.created_users.push(body);
            Json(user).into_response()
        }
        Err(rejection) => rejection,
    }
}

async fn invite_user(
    State(state): State<SharedBackend>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    if let Some(denied) = service_only(&headers) {
        return denied;
    }
    let mut state = state.lock().unwrap();
    let email = body["email"].as_str().unwrap_or_default().to_string();
    match register(&mut state, &email) {
        Ok(user) => {
            state.invites.push((body, query.get("redirect_to").cloned()));
            Json(user).into_response()
        }
        Err(rejection) => rejection,
    }
}

async fn select_profiles(
    State(state): State<SharedBackend>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(denied) = service_only(&headers) {
        return denied;
    }
    let state = state.lock().unwrap();
    let id = query
        .get("id")
        .and_then(|v| v.strip_prefix("eq."))
        .unwrap_or_default();
    let rows: Vec<Value> = state.profiles.get(id).cloned().into_iter().collect();
    Json(Value::Array(rows)).into_response()
}

async fn upsert_profiles(
    State(state): State<SharedBackend>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(rows): Json<Vec<Value>>,
) -> Response {
    if let Some(denied) = service_only(&headers) {
        return denied;
    }
    let mut state = state.lock().unwrap();
    if state.fail_upserts {
        return (
            StatusCode::CONFLICT,
            Json(json!({
                "code": "23503",
                "message": "insert or update on table \"profiles\" violates foreign key constraint"
            })),
        )
            .into_response();
    }
    if query.get("on_conflict").map(String::as_str) != Some("id") {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "expected on_conflict=id" })))
            .into_response();
    }
    for row in rows {
        let id = row["id"].as_str().unwrap_or_default().to_string();
        state.profiles.insert(id, row.clone());
        state.upserts.push(row);
    }
    StatusCode::CREATED.into_response()
}
