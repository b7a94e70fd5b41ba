//! Configuration loading and management

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Secret shipped in the defaults; refused in production
const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// Longest accepted token lifetime, in days
const MAX_TOKEN_EXPIRY_DAYS: i64 = 3650;

/// Main configuration structure
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origin allowed to call the API with credentials
    #[serde(default = "default_client_origin")]
    pub client_origin: String,
    /// Deployment environment; "production" hardens cookies
    #[serde(default = "default_environment")]
    pub environment: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_url")]
    pub url: String,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_token_expiry_days")]
    pub token_expiry_days: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Settings that may be supplied on the command line or through the environment
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Bind address
    #[arg(long, env = "PARLOR_BIND")]
    pub bind: Option<String>,

    /// Port
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Allowed CORS origin
    #[arg(long, env = "CLIENT_ORIGIN")]
    pub client_origin: Option<String>,

    /// Deployment environment (development, production)
    #[arg(long = "env", env = "APP_ENV")]
    pub environment: Option<String>,

    /// Fallback for the deployment environment when APP_ENV is unset
    #[arg(long = "node-env", env = "NODE_ENV", hide = true)]
    pub node_env: Option<String>,

    /// Database connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// JWT signing secret
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_client_origin() -> String {
    "http://localhost:5000".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_db_url() -> String {
    "sqlite:./data/parlor.db?mode=rwc".to_string()
}

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_token_expiry_days() -> i64 {
    7
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            client_origin: default_client_origin(),
            environment: default_environment(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_expiry_days: default_token_expiry_days(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl DatabaseConfig {
    /// Directory holding a file-backed SQLite database, if any
    pub fn sqlite_dir(&self) -> Option<PathBuf> {
        let rest = self
            .url
            .strip_prefix("sqlite://")
            .or_else(|| self.url.strip_prefix("sqlite:"))?;
        let path = rest.split('?').next().unwrap_or(rest);
        if path.is_empty() || path.starts_with(":memory:") {
            return None;
        }
        Path::new(path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Load from file, then layer command-line and environment overrides on top
    pub fn resolve(path: &str, overrides: Overrides) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line/environment overrides
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(bind) = overrides.bind {
            self.server.bind_address = bind;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(origin) = overrides.client_origin {
            self.server.client_origin = origin;
        }
        if let Some(environment) = overrides.environment.or(overrides.node_env) {
            self.server.environment = environment;
        }
        if let Some(url) = overrides.database_url {
            self.database.url = url;
        }
        if let Some(secret) = overrides.jwt_secret {
            self.auth.jwt_secret = secret;
        }
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            anyhow::bail!("auth.jwt_secret must not be empty");
        }
        if self.uses_default_secret() && self.is_production() {
            anyhow::bail!("Refusing to start in production with the default JWT secret");
        }
        if !(1..=MAX_TOKEN_EXPIRY_DAYS).contains(&self.auth.token_expiry_days) {
            anyhow::bail!(
                "auth.token_expiry_days must be between 1 and {}, got {}",
                MAX_TOKEN_EXPIRY_DAYS,
                self.auth.token_expiry_days
            );
        }
        Ok(())
    }

    pub fn uses_default_secret(&self) -> bool {
        self.auth.jwt_secret == DEFAULT_JWT_SECRET
    }

    pub fn is_production(&self) -> bool {
        self.server.environment.eq_ignore_ascii_case("production")
    }

    /// Token lifetime
    pub fn token_expiry(&self) -> chrono::Duration {
        chrono::Duration::days(self.auth.token_expiry_days)
    }
}
