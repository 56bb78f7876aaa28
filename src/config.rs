// Service configuration - TOML file plus environment overrides

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::downloader::backends::any4k::{ClientIdentity, DEFAULT_BASE_URL};
use crate::downloader::models::{NetworkConfig, DEFAULT_COUNTRY, DEFAULT_LANG};

/// Env var naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "MEDIA_RELAY_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub defaults: DefaultsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub metadata_timeout_secs: u64,
    pub download_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// HTTP or SOCKS5 proxy URL
    pub proxy: Option<String>,
    pub platform: String,
    pub sys_version: String,
    pub app_version: String,
    pub bundle_id: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        let network = NetworkConfig::default();
        let identity = ClientIdentity::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            metadata_timeout_secs: network.metadata_timeout,
            download_timeout_secs: network.download_timeout,
            connect_timeout_secs: network.connect_timeout,
            proxy: None,
            platform: identity.platform,
            sys_version: identity.sys_version,
            app_version: identity.app_version,
            bundle_id: identity.bundle_id,
        }
    }
}

impl UpstreamConfig {
    pub fn network(&self) -> NetworkConfig {
        NetworkConfig {
            proxy: self.proxy.clone(),
            metadata_timeout: self.metadata_timeout_secs,
            download_timeout: self.download_timeout_secs,
            connect_timeout: self.connect_timeout_secs,
        }
    }

    pub fn identity(&self) -> ClientIdentity {
        ClientIdentity {
            platform: self.platform.clone(),
            sys_version: self.sys_version.clone(),
            app_version: self.app_version.clone(),
            bundle_id: self.bundle_id.clone(),
        }
    }
}

/// Locale used when a request does not name one
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub lang: String,
    pub country: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            lang: DEFAULT_LANG.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level ("info", "debug", ...)
    pub level: Option<String>,
    /// Extra EnvFilter directives, comma separated
    pub filters: Option<String>,
}

impl Config {
    /// Load from the first config file found, then apply env overrides.
    /// No file at all means built-in defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_file() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// `$MEDIA_RELAY_CONFIG`, `./config.toml`, then the user config dir
    fn find_file() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }

        let local = PathBuf::from("config.toml");
        if local.exists() {
            return Some(local);
        }

        dirs::config_dir()
            .map(|dir| dir.join("media-relay").join("config.toml"))
            .filter(|path| path.exists())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::parse(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!("[Config] Loaded {}", path.display());
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// `PORT`, `HOST`, `MEDIA_RELAY_UPSTREAM`, `MEDIA_RELAY_PROXY`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                key: "PORT",
                value: port.clone(),
            })?;
        }
        if let Some(host) = lookup("HOST").filter(|h| !h.trim().is_empty()) {
            self.server.host = host;
        }
        if let Some(base_url) = lookup("MEDIA_RELAY_UPSTREAM").filter(|u| !u.trim().is_empty()) {
            self.upstream.base_url = base_url;
        }
        if let Some(proxy) = lookup("MEDIA_RELAY_PROXY") {
            self.upstream.proxy = Some(proxy).filter(|p| !p.trim().is_empty());
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
