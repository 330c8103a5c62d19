use std::env;
use std::time::Duration;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::account::service::SessionPolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub revocation: RevocationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL URL; users are kept in memory when absent
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    #[serde(default = "default_reset_ttl_minutes")]
    pub reset_ttl_minutes: i64,
}

impl JwtConfig {
    pub fn session_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        chrono::Duration::try_hours(self.session_ttl_hours).ok_or_else(|| {
            ConfigError::Message("jwt.session_ttl_hours is out of range".into())
        })
    }

    pub fn reset_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        chrono::Duration::try_minutes(self.reset_ttl_minutes).ok_or_else(|| {
            ConfigError::Message("jwt.reset_ttl_minutes is out of range".into())
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RevocationConfig {
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    #[serde(default)]
    pub revoke_sessions_on_password_reset: bool,
}

impl Default for RevocationConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval_secs(),
            revoke_sessions_on_password_reset: false,
        }
    }
}

impl RevocationConfig {
    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            sweep_interval: Duration::from_secs(self.sweep_interval_secs),
            revoke_sessions_on_password_reset: self.revoke_sessions_on_password_reset,
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_session_ttl_hours() -> i64 {
    24
}

fn default_reset_ttl_minutes() -> i64 {
    60
}

fn default_sweep_interval_secs() -> u64 {
    300
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, SERVER__HTTP_PORT, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: DATABASE__URL=postgres://... overrides database.url
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.is_empty() {
            return Err(ConfigError::Message("jwt.secret must not be empty".into()));
        }
        if self.jwt.session_ttl_hours <= 0 {
            return Err(ConfigError::Message(
                "jwt.session_ttl_hours must be positive".into(),
            ));
        }
        if self.jwt.reset_ttl_minutes <= 0 {
            return Err(ConfigError::Message(
                "jwt.reset_ttl_minutes must be positive".into(),
            ));
        }
        if self.jwt.reset_ttl()? >= self.jwt.session_ttl()? {
            return Err(ConfigError::Message(
                "jwt.reset_ttl_minutes must be shorter than the session lifetime".into(),
            ));
        }
        if self.revocation.sweep_interval_secs == 0 {
            return Err(ConfigError::Message(
                "revocation.sweep_interval_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}
