use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::backend::BackendClient;
use crate::config::{AppConfig, BackendConfig, ConfigError, RoleMode, SecurityConfig};
use crate::error::ApiError;
use crate::handlers;
use crate::provisioning::StaffProvisioner;

/// Shared router state
#[derive(Clone)]
pub struct AppState {
    provisioner: Result<Arc<StaffProvisioner>, ConfigError>,
    mode: RoleMode,
}

impl AppState {
    pub fn new(provisioner: StaffProvisioner) -> Self {
        let mode = provisioner.mode();
        Self {
            provisioner: Ok(Arc::new(provisioner)),
            mode,
        }
    }

    /// State for a process whose backend configuration is incomplete.
    /// Every provisioning request answers 500 until it is fixed.
    pub fn misconfigured(error: ConfigError, mode: RoleMode) -> Self {
        Self {
            provisioner: Err(error),
            mode,
        }
    }

    pub fn from_config(config: &AppConfig, backend: Result<BackendConfig, ConfigError>) -> Self {
        let mode = config.provisioning.role_mode;
        match backend {
            Ok(backend) => Self::new(StaffProvisioner::from_client(BackendClient::new(backend), mode)),
            Err(e) => {
                tracing::error!("Backend configuration incomplete: {}", e);
                Self::misconfigured(e, mode)
            }
        }
    }

    pub fn provisioner(&self) -> Result<&StaffProvisioner, ApiError> {
        match &self.provisioner {
            Ok(p) => Ok(p.as_ref()),
            Err(e) => Err(e.clone().into()),
        }
    }

    pub fn config_error(&self) -> Option<&ConfigError> {
        self.provisioner.as_ref().err()
    }

    pub fn mode(&self) -> RoleMode {
        self.mode
    }
}

/// Build the application router
pub fn router(state: AppState, config: &AppConfig) -> Router {
    let provision = post(handlers::provision_staff).fallback(handlers::method_not_allowed);

    let mut app = Router::new()
        .route("/", provision.clone())
        .route("/provision-staff", provision)
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .with_state(state);

    if config.security.enable_cors {
        app = app.layer(cors_layer(&config.security));
    }
    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    app
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("apikey"),
            HeaderName::from_static("x-client-info"),
        ]);

    if security.cors_origins.is_empty() {
        return base.allow_origin(tower_http::cors::Any);
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    base.allow_origin(origins)
}
