use anyhow::Context;
use clap::Args;
use serde_json::{json, Map, Value};

use crate::cli::utils::{output_success, service_error_message};
use crate::cli::OutputFormat;

#[derive(Args, Debug)]
pub struct ProvisionArgs {
    #[arg(long, help = "Email address of the new staff member")]
    pub email: String,

    #[arg(long, help = "Full name of the new staff member")]
    pub full_name: String,

    #[arg(long, help = "Password to set (generated by the service if omitted or shorter than 8 characters)")]
    pub password: Option<String>,

    #[arg(long, conflicts_with = "password", help = "Send an email invitation instead (permissive mode only)")]
    pub invite: bool,

    #[arg(long, help = "Role for the new account (permissive mode only)")]
    pub role: Option<String>,

    #[arg(long, help = "Grant the admin flag (permissive mode only)")]
    pub admin: bool,

    #[arg(long, env = "STAFF_API_TOKEN", hide_env_values = true, help = "Admin bearer token")]
    pub token: String,
}

/// Request body for the provisioning endpoint.
///
/// `send_invite` is only sent when the choice is explicit so the service
/// default applies otherwise.
pub fn request_body(args: &ProvisionArgs) -> Value {
    let mut body = Map::new();
    body.insert("email".into(), json!(args.email));
    body.insert("full_name".into(), json!(args.full_name));

    if let Some(password) = &args.password {
        body.insert("password".into(), json!(password));
        body.insert("send_invite".into(), json!(false));
    } else if args.invite {
        body.insert("send_invite".into(), json!(true));
    }
    if let Some(role) = &args.role {
        body.insert("role".into(), json!(role));
    }
    if args.admin {
        body.insert("is_admin".into(), json!(true));
    }

    Value::Object(body)
}

pub async fn handle(base_url: &str, args: ProvisionArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let url = format!("{}/provision-staff", base_url.trim_end_matches('/'));
    let client = reqwest::Client::new();

    let response = client
        .post(&url)
        .bearer_auth(&args.token)
        .json(&request_body(&args))
        .send()
        .await
        .with_context(|| format!("failed to reach {}", url))?;

    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        anyhow::bail!("{}", service_error_message(status.as_u16(), &text));
    }

    let result: Value = serde_json::from_str(&text).context("service returned invalid JSON")?;
    let id = result.get("id").and_then(Value::as_str).unwrap_or("?");

    let message = if result.get("invited").and_then(Value::as_bool).unwrap_or(false) {
        format!("Invitation sent to {} (id {})", args.email, id)
    } else {
        format!("Created staff account {} (id {})", args.email, id)
    };

    output_success(&output_format, &message, Some(result.clone()))?;

    if output_format == OutputFormat::Text {
        if let Some(password) = result.get("password").and_then(Value::as_str) {
            println!("Password: {}", password);
            println!("Relay this password to the new user over a secure channel.");
        }
    }

    Ok(())
}
