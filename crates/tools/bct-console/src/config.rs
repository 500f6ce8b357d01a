//! Console configuration
//!
//! Sources, lowest precedence first:
//! - Built-in defaults (a local Keycloak on :8080 and the backend on :8082)
//! - A TOML file (`--config`, `BCT_CONFIG_FILE`, or `bct-console.toml`)
//! - Environment variables with the `BCT` prefix, e.g. `BCT__IDENTITY__REALM`

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use bct_identity_keycloak::{InitOptions, KeycloakConfig, OnLoad};
use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

const DEFAULT_CONFIG_FILE: &str = "bct-console.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Keycloak realm and public client
    pub identity: KeycloakConfig,

    /// Admin backend
    pub backend: BackendConfig,

    /// Local session handling
    pub session: SessionConfig,

    pub logging: LoggingConfig,

    /// File the configuration was read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend root URL, without the `/api/admin` prefix
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Where tokens are kept between runs (default: the user config directory)
    pub store_path: Option<PathBuf>,

    /// `check-sso` restores a session silently; `login-required` starts a
    /// login whenever none exists
    pub on_load: OnLoad,

    pub check_login_iframe: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_backend_url() -> String {
    "http://localhost:8082".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            timeout_seconds: default_timeout_seconds(),
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

impl ConsoleConfig {
    /// Load configuration from the optional file and the environment.
    /// Nothing is logged here since logging is set up from the result.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => std::env::var("BCT_CONFIG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE)),
        };

        let mut builder = ConfigBuilder::builder();

        let source = if config_path.exists() {
            builder = builder.add_source(File::from(config_path.as_path()));
            Some(config_path)
        } else if path.is_some() {
            anyhow::bail!("Configuration file {} not found", config_path.display());
        } else {
            None
        };

        builder = builder.add_source(
            Environment::with_prefix("BCT")
                .separator("__") // BCT__BACKEND__URL
                .try_parsing(true),
        );

        let mut settings: ConsoleConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        settings.validate()?;
        settings.source = source;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.identity
            .validate()
            .context("Invalid identity configuration")?;

        Url::parse(&self.backend.url)
            .with_context(|| format!("Invalid backend URL '{}'", self.backend.url))?;
        if self.backend.timeout_seconds == 0 {
            anyhow::bail!("Backend timeout must be greater than 0");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        let level_lower = self.logging.level.to_lowercase();
        if !valid_levels.contains(&level_lower.as_str()) {
            anyhow::bail!(
                "Invalid log level '{}'. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            );
        }

        let valid_formats = ["pretty", "json", "compact"];
        let format_lower = self.logging.format.to_lowercase();
        if !valid_formats.contains(&format_lower.as_str()) {
            anyhow::bail!(
                "Invalid log format '{}'. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            );
        }

        Ok(())
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_seconds)
    }

    pub fn session_store_path(&self) -> Result<PathBuf> {
        match &self.session.store_path {
            Some(path) => Ok(path.clone()),
            None => {
                let dir = dirs::config_dir().context("Failed to get config directory")?;
                Ok(dir.join("bct-console").join("session.json"))
            }
        }
    }

    pub fn init_options(&self) -> InitOptions {
        InitOptions {
            on_load: self.session.on_load,
            check_login_iframe: self.session.check_login_iframe,
            ..InitOptions::default()
        }
    }
}
