use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

use crate::transfer::DEFAULT_TRANSFER_TIMEOUT;
use crate::user_auth::DEFAULT_MAX_FAILED_LOGINS;

/// Environment variable holding the HS256 signing secret
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
/// Overrides `postgres_url` when set
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    /// PostgreSQL connection URL; in-memory store when absent
    #[serde(default)]
    pub postgres_url: Option<String>,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
    /// Never read from YAML
    #[serde(skip)]
    pub jwt_secret: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_ttl_hours: i64,
    pub max_failed_logins: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_ttl_hours: 24,
            max_failed_logins: DEFAULT_MAX_FAILED_LOGINS,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TransferConfig {
    /// Upper bound on one transfer unit, lock waits included
    pub timeout_ms: u64,
    /// PostgreSQL `lock_timeout` for row locks
    pub lock_timeout_ms: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TRANSFER_TIMEOUT.as_millis() as u64,
            lock_timeout_ms: 5000,
        }
    }
}

impl TransferConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl AppConfig {
    /// Load `config/<env>.yaml` and apply environment overrides.
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        let mut config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config yaml: {}", config_path))?;

        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            config.postgres_url = Some(url);
        }
        config.jwt_secret = std::env::var(JWT_SECRET_ENV)
            .with_context(|| format!("{} must be set", JWT_SECRET_ENV))?;
        if config.jwt_secret.is_empty() {
            anyhow::bail!("{} must not be empty", JWT_SECRET_ENV);
        }
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }
}
