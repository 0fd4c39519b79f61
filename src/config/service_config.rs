use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults::{
    DEFAULT_MODEL_DIR, DEFAULT_SERVER_ADDR, DEFAULT_STORE_URI, MAX_UPLOAD_BYTES, MEMORY_STORE_URI,
    REQUEST_TIMEOUT_SECS, STORE_TIMEOUT_MS,
};
use crate::analytics::AnomalyConfig;
use crate::model::UnmappedClusterPolicy;

/// Env var naming an explicit config file.
pub const CONFIG_ENV: &str = "RECORE_CONFIG";
/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "recore.toml";

pub const STORE_URI_ENV: &str = "RECORE_STORE_URI";
/// Accepted for deployments that still export the legacy variable.
pub const LEGACY_STORE_URI_ENV: &str = "MONGO_URI";
pub const MODEL_DIR_ENV: &str = "RECORE_MODEL_DIR";
pub const SERVER_ADDR_ENV: &str = "RECORE_SERVER_ADDR";

/// Complete service configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub model: ModelConfig,
    pub anomaly: AnomalyConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    /// Comma-separated allowed origins; empty allows any origin.
    pub cors_origins: String,
    pub max_upload_bytes: usize,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_SERVER_ADDR.to_string(),
            cors_origins: String::new(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// `memory://`, `sled://<path>` or a bare filesystem path.
    pub uri: String,
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_STORE_URI.to_string(),
            timeout_ms: STORE_TIMEOUT_MS,
        }
    }
}

/// Where the record store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    Sled(PathBuf),
}

impl StoreConfig {
    pub fn location(&self) -> Result<StoreLocation, String> {
        let uri = self.uri.trim();
        if uri == MEMORY_STORE_URI {
            return Ok(StoreLocation::Memory);
        }
        if let Some(path) = uri.strip_prefix("sled://") {
            if path.is_empty() {
                return Err("store.uri: sled:// needs a path".to_string());
            }
            return Ok(StoreLocation::Sled(PathBuf::from(path)));
        }
        if let Some((scheme, _)) = uri.split_once("://") {
            return Err(format!("store.uri: unsupported scheme '{scheme}://'"));
        }
        if uri.is_empty() {
            return Err("store.uri must not be empty".to_string());
        }
        Ok(StoreLocation::Sled(PathBuf::from(uri)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub dir: PathBuf,
    /// What to do with a cluster id the label table does not cover.
    pub unmapped_cluster: UnmappedClusterPolicy,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_MODEL_DIR),
            unmapped_cluster: UnmappedClusterPolicy::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration using the standard search order:
    /// 1. `explicit` (the `--config` flag), which must load
    /// 2. `$RECORE_CONFIG`
    /// 3. `./recore.toml`
    /// 4. Built-in defaults
    ///
    /// Environment overrides are applied on top, then the result is validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(explicit, |key| std::env::var(key).ok())
    }

    /// [`ServiceConfig::load`] with overrides read through `lookup`.
    pub fn load_with<F>(explicit: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match explicit {
            Some(path) => {
                let config = Self::load_from_file(path)?;
                info!(path = %path.display(), "Loaded service config from --config");
                config
            }
            None => Self::search(),
        };
        config.apply_env_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    fn search() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded service config from RECORE_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from RECORE_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "RECORE_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded service config from ./recore.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./recore.toml, using defaults");
                }
            }
        }

        info!("No recore.toml found, using built-in defaults");
        Self::default()
    }

    /// Parse a TOML file. Unknown keys are logged, not rejected.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }
        toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Apply `RECORE_*` overrides read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(uri) = non_empty(STORE_URI_ENV).or_else(|| non_empty(LEGACY_STORE_URI_ENV)) {
            info!(uri = %uri, "Store URI overridden from environment");
            self.store.uri = uri;
        }
        if let Some(dir) = non_empty(MODEL_DIR_ENV) {
            info!(dir = %dir, "Model directory overridden from environment");
            self.model.dir = PathBuf::from(dir);
        }
        if let Some(addr) = non_empty(SERVER_ADDR_ENV) {
            self.server.addr = addr;
        }
    }

    /// Check every constraint and report all violations together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();
        let a = &self.anomaly;

        if !(a.contamination > 0.0 && a.contamination <= 0.5) {
            errors.push(format!(
                "anomaly.contamination must be in (0, 0.5] (got {})",
                a.contamination
            ));
        }
        if a.n_trees == 0 {
            errors.push("anomaly.n_trees must be > 0".to_string());
        }
        if a.max_samples == 0 {
            errors.push("anomaly.max_samples must be > 0".to_string());
        }
        if self.store.timeout_ms == 0 {
            errors.push("store.timeout_ms must be > 0".to_string());
        }
        // An unusable store URI degrades the service at startup instead.
        if self.store.uri.trim().is_empty() {
            errors.push("store.uri must not be empty".to_string());
        }
        if self.server.request_timeout_secs == 0 {
            errors.push("server.request_timeout_secs must be > 0".to_string());
        }
        if self.server.max_upload_bytes == 0 {
            errors.push("server.max_upload_bytes must be > 0".to_string());
        }
        if self.server.addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!(
                "server.addr is not a valid socket address: {}",
                self.server.addr
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, std::io::Error),
    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(toml::ser::Error),
    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}
