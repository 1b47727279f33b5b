use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

/// Environment variable holding the backend base URL.
pub const BACKEND_URL_VAR: &str = "SUPABASE_URL";
/// Environment variable holding the public key used to validate caller tokens.
pub const ANON_KEY_VAR: &str = "SUPABASE_ANON_KEY";
/// Environment variable holding the privileged key used for admin operations.
pub const SERVICE_KEY_VAR: &str = "SUPABASE_SERVICE_ROLE_KEY";
/// Optional redirect URL passed along with invitations.
pub const INVITE_REDIRECT_VAR: &str = "INVITE_REDIRECT_TO";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub provisioning: ProvisioningConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// How much of the caller's request is allowed to shape the new account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleMode {
    /// Always a non-admin "staff" account created with a password.
    Strict,
    /// Caller may pick role, admin flag and invite vs. password.
    Permissive,
}

impl RoleMode {
    pub fn from_strict_flag(strict: bool) -> Self {
        if strict {
            RoleMode::Strict
        } else {
            RoleMode::Permissive
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    pub role_mode: RoleMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

/// Errors raised while reading backend configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Connection details for the hosted auth and data backend.
#[derive(Clone)]
pub struct BackendConfig {
    pub url: Url,
    pub anon_key: String,
    pub service_role_key: String,
    pub invite_redirect_to: Option<String>,
}

// Keys stay out of debug output so the struct can be logged safely.
impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"<redacted>")
            .field("service_role_key", &"<redacted>")
            .field("invite_redirect_to", &self.invite_redirect_to)
            .finish()
    }
}

impl BackendConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as missing.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &'static str| -> Option<String> {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let raw_url = read(BACKEND_URL_VAR).ok_or(ConfigError::Missing(BACKEND_URL_VAR))?;
        let anon_key = read(ANON_KEY_VAR).ok_or(ConfigError::Missing(ANON_KEY_VAR))?;
        let service_role_key = read(SERVICE_KEY_VAR).ok_or(ConfigError::Missing(SERVICE_KEY_VAR))?;

        let url = Url::parse(raw_url.trim_end_matches('/')).map_err(|e| ConfigError::Invalid {
            name: BACKEND_URL_VAR,
            reason: e.to_string(),
        })?;

        if url.cannot_be_a_base() {
            return Err(ConfigError::Invalid {
                name: BACKEND_URL_VAR,
                reason: "must be an absolute http(s) URL".to_string(),
            });
        }

        Ok(Self {
            url,
            anon_key,
            service_role_key,
            invite_redirect_to: read(INVITE_REDIRECT_VAR),
        })
    }

    /// Join a backend path (e.g. `auth/v1/user`) onto the base URL.
    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.url.clone();
        let base = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{}/{}", base, path.trim_start_matches('/')));
        url
    }
}

/// Read a boolean override. Unrecognized values are logged and ignored.
fn env_flag(name: &str) -> Option<bool> {
    let raw = env::var(name).ok()?;
    let parsed = parse_flag(&raw);
    if parsed.is_none() {
        tracing::warn!("Ignoring {}='{}': expected true/false, 1/0, yes/no or on/off", name, raw);
    }
    parsed
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(strict) = env_flag("STAFF_STRICT_ROLE_MODE") {
            self.provisioning.role_mode = RoleMode::from_strict_flag(strict);
        }

        if let Some(raw) = env::var("STAFF_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            match raw.trim().parse::<u16>() {
                Ok(port) => self.api.port = port,
                Err(_) => tracing::warn!("Ignoring port '{}': not a valid port number", raw),
            }
        }
        if let Some(enabled) = env_flag("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = enabled;
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            match v.trim().parse::<usize>() {
                Ok(bytes) => self.api.max_request_size_bytes = bytes,
                Err(_) => tracing::warn!(
                    "Ignoring API_MAX_REQUEST_SIZE_BYTES='{}': not a byte count",
                    v
                ),
            }
        }

        if let Some(enabled) = env_flag("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = enabled;
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            provisioning: ProvisioningConfig { role_mode: RoleMode::Strict },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 64 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                // empty list means any origin
                cors_origins: Vec::new(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            provisioning: ProvisioningConfig { role_mode: RoleMode::Strict },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 16 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            provisioning: ProvisioningConfig { role_mode: RoleMode::Strict },
            api: ApiConfig {
                port: 8080,
                enable_request_logging: false,
                max_request_size_bytes: 16 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}
