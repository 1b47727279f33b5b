use axum::{extract::State, http::StatusCode};
use serde_json::{json, Value};

use crate::api::ApiResponse;
use crate::app::AppState;

/// GET /health - liveness plus a check that backend configuration is complete
pub async fn health(State(state): State<AppState>) -> ApiResponse<Value> {
    let now = chrono::Utc::now();
    let version = env!("CARGO_PKG_VERSION");

    match state.config_error() {
        None => ApiResponse::success(json!({
            "ok": true,
            "status": "ok",
            "service": "staff-provisioning",
            "version": version,
            "timestamp": now,
            "mode": state.mode(),
            "backend_configured": true,
        })),
        Some(e) => ApiResponse::with_status(
            json!({
                "ok": false,
                "status": "degraded",
                "service": "staff-provisioning",
                "version": version,
                "timestamp": now,
                "mode": state.mode(),
                "backend_configured": false,
                "error": e.to_string(),
            }),
            StatusCode::SERVICE_UNAVAILABLE,
        ),
    }
}
