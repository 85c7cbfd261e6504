//! Configuration system for CyberSOC.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! explicit config file -> environment -> CLI overrides.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::scenarios::Scenario;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub api: ApiConfig,
    /// Extra threat scenarios merged over the built-in catalog.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scenarios: BTreeMap<String, Scenario>,
    /// Extra action outcome messages merged over the built-in catalog.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub actions: BTreeMap<String, String>,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on (0 picks an ephemeral port).
    pub port: u16,
    /// Directory served under `/static`, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            static_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// SQLite storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the SQLite database file.
    pub path: PathBuf,
    /// Insert a handful of sample logs when the `logs` table is empty.
    pub seed_sample_logs: bool,
    /// Reject response actions that reference a non-existent alert.
    pub enforce_alert_reference: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("soc_database.db"),
            seed_sample_logs: true,
            enforce_alert_reference: false,
        }
    }
}

/// Background log generator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub enabled: bool,
    /// Lower bound of the randomized sleep between generated logs.
    pub min_interval_ms: u64,
    /// Upper bound of the randomized sleep between generated logs.
    pub max_interval_ms: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_interval_ms: 3_000,
            max_interval_ms: 8_000,
        }
    }
}

/// Read-endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Maximum number of rows returned by `/api/logs`.
    pub recent_log_limit: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            recent_log_limit: 30,
        }
    }
}

impl SocConfig {
    /// Reject settings that cannot work at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generator.min_interval_ms > self.generator.max_interval_ms {
            return Err(ConfigError::Invalid {
                message: format!(
                    "generator.min_interval_ms ({}) exceeds generator.max_interval_ms ({})",
                    self.generator.min_interval_ms, self.generator.max_interval_ms
                ),
            });
        }
        if self.api.recent_log_limit == 0 {
            return Err(ConfigError::Invalid {
                message: "api.recent_log_limit must be positive".to_string(),
            });
        }
        if self.storage.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                message: "storage.path must not be empty".to_string(),
            });
        }
        for (key, scenario) in &self.scenarios {
            if scenario.logs.is_empty() {
                return Err(ConfigError::Invalid {
                    message: format!("scenario '{key}' has no log lines"),
                });
            }
        }
        Ok(())
    }
}

/// Path of the user-level config file (`~/.config/cybersoc/config.toml`).
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "cybersoc", "cybersoc")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `CYBERSOC_`)
/// 2. Explicit config file
/// 3. User config (`~/.config/cybersoc/config.toml`)
/// 4. Built-in defaults
///
/// Command-line flags are applied by the caller on the returned value.
pub fn load_config(config_file: Option<&Path>) -> Result<SocConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(SocConfig::default()));

    if let Some(user_config) = user_config_path()
        && user_config.exists()
    {
        figment = figment.merge(Toml::file(&user_config));
    }

    if let Some(path) = config_file {
        figment = figment.merge(Toml::file(path));
    }

    // CYBERSOC_SERVER__PORT, CYBERSOC_STORAGE__PATH, etc.
    figment = figment.merge(Env::prefixed("CYBERSOC_").split("__"));

    let config: SocConfig = figment.extract().map_err(Box::new)?;
    config.validate()?;
    Ok(config)
}
