use anyhow::Context;
use serde_json::Value;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

pub async fn handle(base_url: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let url = format!("{}/health", base_url.trim_end_matches('/'));
    let client = reqwest::Client::new();

    let response = client
        .get(&url)
        .timeout(std::time::Duration::from_secs(5))
        .send()
        .await
        .with_context(|| format!("failed to reach {}", url))?;

    let status = response.status();
    let body: Value = response.json().await.context("health endpoint returned invalid JSON")?;

    if !status.is_success() {
        let reason = body.get("error").and_then(Value::as_str).unwrap_or("degraded");
        anyhow::bail!("{} is unhealthy: {}", base_url, reason);
    }

    let mode = body.get("mode").and_then(Value::as_str).unwrap_or("unknown");
    output_success(
        &output_format,
        &format!("{} is up ({} mode)", base_url, mode),
        Some(body),
    )
}
