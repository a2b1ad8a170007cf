//! Server configuration.
//!
//! Sources, later ones winning: built-in defaults, an optional TOML file
//! (`~/.config/eventide/config.toml` unless `--config` is given), then
//! `EVENTIDE_*` environment variables (`EVENTIDE_RECURRENCE__HORIZON_DAYS`
//! for nested keys).

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use eventide_core::RecurrenceLimits;
use eventide_core::recurrence::{DEFAULT_HORIZON_DAYS, DEFAULT_MAX_OCCURRENCES};
use serde::Deserialize;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 4096;
pub const DEFAULT_API_PREFIX: &str = "/api";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Path all routes are mounted under; empty or `/` mounts at the root.
    pub api_prefix: String,
    /// JSON snapshot file. Without it events live in memory only.
    pub data_file: Option<PathBuf>,
    pub log_level: String,
    #[serde(default)]
    pub recurrence: RecurrenceLimits,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            data_file: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            recurrence: RecurrenceLimits::default(),
        }
    }
}

impl ServerConfig {
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("eventide").join("config.toml"))
    }

    /// Load configuration. An explicitly given file must exist; the default
    /// file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("host", DEFAULT_HOST)?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("api_prefix", DEFAULT_API_PREFIX)?
            .set_default("log_level", DEFAULT_LOG_LEVEL)?
            .set_default(
                "recurrence.max_occurrences",
                i64::try_from(DEFAULT_MAX_OCCURRENCES)?,
            )?
            .set_default("recurrence.horizon_days", i64::from(DEFAULT_HORIZON_DAYS))?;

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path.to_path_buf()).required(true));
            }
            None => {
                if let Some(default_path) = Self::default_config_path() {
                    builder = builder.add_source(File::from(default_path).required(false));
                }
            }
        }

        let config: ServerConfig = builder
            .add_source(
                Environment::with_prefix("EVENTIDE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.recurrence
            .validate()
            .context("Invalid recurrence limits")?;

        if !self.api_prefix.is_empty() && !self.api_prefix.starts_with('/') {
            anyhow::bail!("api_prefix must start with '/', got '{}'", self.api_prefix);
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("Invalid host '{}'", self.host))?;
        Ok(SocketAddr::from((ip, self.port)))
    }
}
