//! Configuration loading and management
//!
//! Every section is optional; an empty document yields the defaults:
//!
//! ```yaml
//! server:
//!   bind: 127.0.0.1:3000
//!   cors_origins: [http://localhost:5173]
//! storage:
//!   backend: mongodb            # or in_memory (default)
//!   uri: mongodb://localhost:27017
//!   database: marquee
//! pagination:
//!   default_page_size: 10
//!   max_page_size: 100
//! logging:
//!   filter: info
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

use crate::core::error::ConfigError;
use crate::core::query::{DEFAULT_MAX_PAGE_SIZE, DEFAULT_PAGE_SIZE, PaginationLimits};

/// Environment variable naming the config file when no CLI argument is given
pub const CONFIG_ENV_VAR: &str = "MARQUEE_CONFIG";

/// Complete configuration for the catalog service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub pagination: PaginationConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,

    /// Origins allowed by CORS; empty allows any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            cors_origins: Vec::new(),
        }
    }
}

/// Which store backs the catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageConfig {
    #[default]
    InMemory,
    Mongodb { uri: String, database: String },
}

impl StorageConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            StorageConfig::InMemory => "in_memory",
            StorageConfig::Mongodb { .. } => "mongodb",
        }
    }
}

/// Page size bounds for list requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl From<PaginationConfig> for PaginationLimits {
    fn from(config: PaginationConfig) -> Self {
        PaginationLimits {
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }
}

/// Log filter used when `RUST_LOG` is unset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl CatalogConfig {
    /// Load and validate configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.display().to_string()),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            file: None,
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        for origin in &self.server.cors_origins {
            if axum::http::HeaderValue::from_str(origin).is_err() {
                return Err(invalid("server.cors_origins", origin, "not a valid origin"));
            }
        }

        let p = &self.pagination;
        if p.default_page_size == 0 {
            return Err(invalid(
                "pagination.default_page_size",
                p.default_page_size,
                "must be at least 1",
            ));
        }
        if p.max_page_size < p.default_page_size {
            return Err(invalid(
                "pagination.max_page_size",
                p.max_page_size,
                "must not be below default_page_size",
            ));
        }

        if let StorageConfig::Mongodb { uri, database } = &self.storage {
            if uri.trim().is_empty() {
                return Err(invalid("storage.uri", uri, "must not be empty"));
            }
            if database.trim().is_empty() {
                return Err(invalid("storage.database", database, "must not be empty"));
            }
        }

        if self.logging.filter.trim().is_empty() {
            return Err(invalid("logging.filter", &self.logging.filter, "must not be empty"));
        }
        Ok(())
    }

    /// Parsed listener address
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|e: std::net::AddrParseError| invalid("server.bind", &self.server.bind, e))
    }

    pub fn pagination_limits(&self) -> PaginationLimits {
        self.pagination.into()
    }
}

fn invalid(field: &str, value: impl ToString, message: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}
