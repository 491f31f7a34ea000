//! # Configuration Module
//!
//! Optional TOML configuration for the Grocer binary.
//!
//! Every section and every key may be omitted; missing values fall back to
//! the defaults below. Environment variables (`GROCER_API_KEY`,
//! `GROCER_CORS_ORIGINS`, `GROCER_RATE_LIMIT`) take precedence over the file
//! and are read by the API layer at router construction.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [catalog]
//! path = "demos/catalog.json"
//!
//! [matching]
//! include_unavailable = false
//! recommendation_limit = 3
//!
//! [api]
//! cors_origins = ["http://localhost:3000"]
//! rate_limit = 100
//! body_limit_bytes = 2097152
//! max_sessions = 1024
//! ```

use grocer_core::primitives::RECOMMENDATION_LIMIT;
use grocer_core::{GrocerError, MatchOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default request body limit (2 MiB).
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

/// Default cap on concurrently live shopper sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

/// Largest config file accepted (64 KiB).
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

// =============================================================================
// SECTIONS
// =============================================================================

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// `[catalog]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// JSON catalog loaded at startup.
    pub path: Option<PathBuf>,
}

/// `[matching]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub include_unavailable: bool,
    pub recommendation_limit: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            include_unavailable: false,
            recommendation_limit: RECOMMENDATION_LIMIT,
        }
    }
}

/// `[api]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Allowed CORS origins; `["*"]` allows all.
    pub cors_origins: Option<Vec<String>>,
    /// Requests per second; 0 disables limiting.
    pub rate_limit: Option<u32>,
    pub body_limit_bytes: usize,
    pub max_sessions: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: None,
            rate_limit: None,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

// =============================================================================
// GROCER CONFIG
// =============================================================================

/// Complete configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrocerConfig {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub matching: MatchingConfig,
    pub api: ApiConfig,
}

impl GrocerConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, GrocerError> {
        let config: Self =
            toml::from_str(text).map_err(|e| GrocerError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, GrocerError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            GrocerError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(GrocerError::InvalidConfig(format!(
                "Config file size {} bytes exceeds maximum {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            GrocerError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load `path` if given, else return defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, GrocerError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Matcher options derived from `[matching]`.
    #[must_use]
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            include_unavailable: self.matching.include_unavailable,
        }
    }

    fn validate(&self) -> Result<(), GrocerError> {
        if self.server.host.trim().is_empty() {
            return Err(GrocerError::InvalidConfig(
                "server.host must not be empty".to_string(),
            ));
        }
        if self.api.body_limit_bytes == 0 {
            return Err(GrocerError::InvalidConfig(
                "api.body_limit_bytes must be positive".to_string(),
            ));
        }
        if self.api.max_sessions == 0 {
            return Err(GrocerError::InvalidConfig(
                "api.max_sessions must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
