//! TOML-based configuration for reportgrid.
//!
//! Example configuration:
//! ```toml
//! [server]
//! base_url = "https://reports.example.com"
//! api_key = "${REPORTGRID_API_KEY}"
//! api_secret = "${REPORTGRID_API_SECRET}"
//! method_namespace = "jmit_report_builder.api"
//! timeout_secs = 30
//! transport = "http"
//!
//! [bridge]
//! path = "./report-bridge"
//! args = ["--site", "default"]
//!
//! [render]
//! header_strategy = "first_row"
//! placeholder = "No data available"
//!
//! [export]
//! default_format = "csv"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::render::{HeaderStrategy, Renderer, DEFAULT_PLACEHOLDER};
use crate::report::ExportFormat;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "REPORTGRID_CONFIG";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub bridge: BridgeSettings,
    pub render: RenderSettings,
    pub export: ExportSettings,
}

/// How calls reach the report server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Http,
    Process,
}

/// Report server connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Base URL (supports ${ENV_VAR} expansion).
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    /// Prefix of every method path.
    pub method_namespace: String,
    pub timeout_secs: u64,
    pub transport: TransportKind,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_key: None,
            api_secret: None,
            method_namespace: "jmit_report_builder.api".to_string(),
            timeout_secs: 30,
            transport: TransportKind::Http,
        }
    }
}

impl ServerSettings {
    /// Copy with `${VAR}` references in URL and credentials expanded.
    pub fn resolved(&self) -> Result<Self, SettingsError> {
        let expand = |v: &Option<String>| v.as_deref().map(expand_env_vars).transpose();
        Ok(Self {
            base_url: expand_env_vars(&self.base_url)?,
            api_key: expand(&self.api_key)?,
            api_secret: expand(&self.api_secret)?,
            ..self.clone()
        })
    }
}

/// Bridge program for the process transport.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeSettings {
    pub path: Option<String>,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderSettings {
    pub header_strategy: HeaderStrategy,
    pub placeholder: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            header_strategy: HeaderStrategy::FirstRow,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl RenderSettings {
    pub fn renderer(&self) -> Renderer {
        Renderer::new()
            .with_header_strategy(self.header_strategy)
            .with_placeholder(self.placeholder.clone())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportSettings {
    pub default_format: ExportFormat,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.check()?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `REPORTGRID_CONFIG`
    /// 2. `./reportgrid.toml`
    /// 3. `<config dir>/reportgrid/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("reportgrid.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("reportgrid").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Explicit path if given, otherwise the default lookup.
    pub fn load_from(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::load(),
        }
    }

    fn check(&self) -> Result<(), SettingsError> {
        if self.server.timeout_secs == 0 {
            return Err(SettingsError::InvalidConfig(
                "server.timeout_secs must be positive".into(),
            ));
        }
        if self.server.api_key.is_some() != self.server.api_secret.is_some() {
            return Err(SettingsError::InvalidConfig(
                "server.api_key and server.api_secret must be set together".into(),
            ));
        }
        if self.server.transport == TransportKind::Process && self.bridge.path.is_none() {
            return Err(SettingsError::InvalidConfig(
                "transport = \"process\" needs bridge.path".into(),
            ));
        }
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. A `$` not followed by a name is kept.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('$') {
        result.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            let end = braced.find('}').ok_or_else(|| {
                SettingsError::InvalidConfig(format!("unterminated ${{ in {s:?}"))
            })?;
            (&braced[..end], end + 2)
        } else {
            let end = after
                .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        if name.is_empty() && consumed == 0 {
            result.push('$');
        } else {
            let value =
                env::var(name).map_err(|_| SettingsError::MissingEnvVar(name.to_string()))?;
            result.push_str(&value);
        }
        rest = &after[consumed..];
    }

    result.push_str(rest);
    Ok(result)
}
