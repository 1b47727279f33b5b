use staff_provisioning::app::{router, AppState};
use staff_provisioning::config::{AppConfig, BackendConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up SUPABASE_URL and the keys
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env();
    tracing::info!(
        "Starting staff provisioning in {:?} mode ({:?} roles)",
        config.environment,
        config.provisioning.role_mode
    );

    let backend = BackendConfig::from_env();
    if let Ok(backend) = &backend {
        tracing::info!("Using backend {}", backend.url);
    }

    let app = router(AppState::from_config(&config, backend), &config);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Staff provisioning listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
