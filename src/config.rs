//! Application configuration
//!
//! Loaded from a TOML file (default `~/.config/ficha-semanal/config.toml`),
//! then overridden by environment variables. A missing file is not an
//! error: every section has defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::crypto::JwtConfig;
use crate::infrastructure::{DatabaseConfig, PoolConfig};

/// Database URL value that selects the in-memory store.
pub const MEMORY_DATABASE_URL: &str = "memory";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Default config file location
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ficha-semanal")
        .join("config.toml")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Request bodies above this size are rejected with 413
    pub max_body_bytes: usize,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_body_bytes: 1024 * 1024,
            shutdown_timeout: 30,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// Connection URL. Empty means a SQLite file named after `name`;
    /// `"memory"` keeps submissions in process memory.
    pub url: String,
    pub name: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        let pool = PoolConfig::default();
        Self {
            url: String::new(),
            name: "watt_consultoria".to_string(),
            max_connections: pool.max_connections,
            connect_timeout_secs: pool.connect_timeout_secs,
            acquire_timeout_secs: pool.acquire_timeout_secs,
            idle_timeout_secs: pool.idle_timeout_secs,
        }
    }
}

impl DatabaseSection {
    pub fn is_memory(&self) -> bool {
        self.url == MEMORY_DATABASE_URL
    }

    pub fn connection_url(&self) -> String {
        if self.url.trim().is_empty() {
            format!("sqlite://./{}.db?mode=rwc", self.name)
        } else {
            self.url.trim().to_string()
        }
    }

    pub fn to_database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.connection_url(),
            pool: PoolConfig {
                max_connections: self.max_connections,
                connect_timeout_secs: self.connect_timeout_secs,
                acquire_timeout_secs: self.acquire_timeout_secs,
                idle_timeout_secs: self.idle_timeout_secs,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Token signing secret. Unset keeps the insecure default for issuing
    /// and leaves the submit path open.
    pub jwt_secret: Option<String>,
    /// `x-api-key` secret for the write endpoint
    pub api_secret_key: Option<String>,
    /// `x-api-key` secret for the BI read endpoint
    pub powerbi_api_key: Option<String>,
    /// `"development"` disables API-key checks
    pub environment: String,
    /// Hostnames allowed to request tokens; empty disables the check
    pub allowed_origins: Vec<String>,
    /// Guard `POST /salvar-ficha` with a bearer token
    pub require_submit_token: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            api_secret_key: None,
            powerbi_api_key: None,
            environment: "production".to_string(),
            allowed_origins: Vec::new(),
            require_submit_token: true,
        }
    }
}

impl SecurityConfig {
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::new(self.jwt_secret.clone())
    }

    /// Open authentication paths this configuration leaves in place.
    ///
    /// These are kept deliberately and reported at startup so an operator
    /// makes the call explicitly.
    pub fn posture_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.jwt_secret.as_deref().map_or(true, str::is_empty) {
            warnings.push("JWT_SECRET is not set: tokens are signed with the built-in default secret".to_string());
            if self.require_submit_token {
                warnings.push("JWT_SECRET is not set: POST /salvar-ficha accepts requests without a token".to_string());
            }
        }
        if !self.require_submit_token {
            warnings.push("require_submit_token = false: POST /salvar-ficha is unauthenticated".to_string());
        }
        if self.is_development() {
            warnings.push("environment = development: API-key checks are disabled".to_string());
        } else {
            if self.api_secret_key.is_none() {
                warnings.push("API_SECRET_KEY is not set: POST /api-fichas will reject every request".to_string());
            }
            if self.powerbi_api_key.is_none() {
                warnings.push("POWERBI_API_KEY is not set: GET /api-powerbi will reject every request".to_string());
            }
        }
        warnings
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Also serve the BI export on `GET /salvar-ficha` (read API key)
    pub export_on_submit_path: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub security: SecurityConfig,
    pub features: FeaturesConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Read `path` (if it exists) and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            Self::default()
        };
        config.apply_env_from(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(name) = non_empty("DB_NAME") {
            self.database.name = name;
        }
        if let Some(secret) = non_empty("JWT_SECRET") {
            self.security.jwt_secret = Some(secret);
        }
        if let Some(key) = non_empty("API_SECRET_KEY") {
            self.security.api_secret_key = Some(key);
        }
        if let Some(key) = non_empty("POWERBI_API_KEY") {
            self.security.powerbi_api_key = Some(key);
        }
        if let Some(env) = non_empty("APP_ENV").or_else(|| non_empty("NODE_ENV")) {
            self.security.environment = env;
        }
        if let Some(origins) = non_empty("FICHA_ALLOWED_ORIGINS") {
            self.security.allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Some(port) = non_empty("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }
}
