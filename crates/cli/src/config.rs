//! Layered configuration for the relay.
//!
//! Sources, highest priority first:
//! 1. Command-line overrides (`--bind`, `--mapping`)
//! 2. Environment variables with the `SG_RELAY_` prefix (`__` separates nested keys)
//! 3. Unprefixed `SHOTGRID_URL`, `SHOTGRID_API_KEY`, `SHOTGRID_SCRIPT_NAME`, `SECRET_TOKEN`
//! 4. The JSON config file (keys are matched case-insensitively, so legacy
//!    upper-case files still load)
//! 5. Built-in defaults

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Json, Serialized, Yaml},
    value::Dict,
    Figment, Profile, Provider,
};
use propagation::{RelayError, StatusMapping};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_PREFIX: &str = "SG_RELAY_";
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

const LEGACY_ENV_KEYS: [&str; 4] = [
    "shotgrid_url",
    "shotgrid_api_key",
    "shotgrid_script_name",
    "secret_token",
];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment extraction or merge error.
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("Missing required configuration value '{field}'")]
    Missing { field: &'static str },

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Status mapping file '{}' does not exist", .0.display())]
    MappingNotFound(PathBuf),

    #[error(transparent)]
    Mapping(#[from] RelayError),
}

// ---------------------------------------------------------------------------
// RelayConfig
// ---------------------------------------------------------------------------

#[derive(Clone, Deserialize, Serialize)]
pub struct RelayConfig {
    /// Site root, e.g. `https://studio.shotgrid.autodesk.com`.
    #[serde(default)]
    pub shotgrid_url: String,
    #[serde(default)]
    pub shotgrid_api_key: String,
    #[serde(default)]
    pub shotgrid_script_name: String,
    /// Shared secret used to sign webhook deliveries.
    #[serde(default)]
    pub secret_token: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_mapping_path")]
    pub mapping_path: PathBuf,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// OTLP collector endpoint; spans are only exported when set.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_mapping_path() -> PathBuf {
    PathBuf::from("status_mapping.yaml")
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            shotgrid_url: String::new(),
            shotgrid_api_key: String::new(),
            shotgrid_script_name: String::new(),
            secret_token: String::new(),
            bind_addr: default_bind_addr(),
            mapping_path: default_mapping_path(),
            request_timeout_secs: default_request_timeout_secs(),
            otlp_endpoint: None,
        }
    }
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("shotgrid_url", &self.shotgrid_url)
            .field("shotgrid_script_name", &self.shotgrid_script_name)
            .field("bind_addr", &self.bind_addr)
            .field("mapping_path", &self.mapping_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("otlp_endpoint", &self.otlp_endpoint)
            .finish_non_exhaustive()
    }
}

impl RelayConfig {
    /// Load from every source, reading the JSON file at `config_path` if it exists.
    pub fn load(config_path: &Path) -> Result<Self, ConfigError> {
        Self::figment(config_path)?
            .extract()
            .map_err(ConfigError::from)
    }

    /// Build the provider chain without extracting it.
    pub fn figment(config_path: &Path) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if config_path.exists() {
            figment = figment.merge(Serialized::defaults(json_file_dict(config_path)?));
        }

        Ok(figment
            .merge(Env::raw().only(&LEGACY_ENV_KEYS))
            .merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Reject configurations the relay cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("shotgrid_url", &self.shotgrid_url),
            ("shotgrid_api_key", &self.shotgrid_api_key),
            ("shotgrid_script_name", &self.shotgrid_script_name),
            ("secret_token", &self.secret_token),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing { field });
            }
        }

        if !(self.shotgrid_url.starts_with("http://") || self.shotgrid_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "shotgrid_url",
                reason: format!("'{}' is not an http(s) URL", self.shotgrid_url),
            });
        }

        self.socket_addr()?;

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
                field: "bind_addr",
                reason: e.to_string(),
            })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Host part of `shotgrid_url`, for logging.
    pub fn shotgrid_host(&self) -> &str {
        let rest = self
            .shotgrid_url
            .split_once("://")
            .map_or(self.shotgrid_url.as_str(), |(_, rest)| rest);
        rest.split('/').next().unwrap_or(rest)
    }
}

/// Reads a JSON config file and lower-cases its top-level keys.
fn json_file_dict(path: &Path) -> Result<Dict, ConfigError> {
    let data = Figment::from(Json::file(path)).data()?;
    Ok(data
        .into_iter()
        .filter(|(profile, _)| *profile == Profile::Default)
        .flat_map(|(_, dict)| dict)
        .map(|(key, value)| (key.to_ascii_lowercase(), value))
        .collect())
}

// ---------------------------------------------------------------------------
// Status mapping
// ---------------------------------------------------------------------------

/// Load and validate the YAML status mapping.
pub fn load_mapping(path: &Path) -> Result<StatusMapping, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MappingNotFound(path.to_path_buf()));
    }
    let mapping: StatusMapping = Figment::from(Yaml::file(path)).extract()?;
    mapping.validate()?;
    Ok(mapping)
}
