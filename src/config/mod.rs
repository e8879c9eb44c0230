//! Configuration module for reportgrid.
//!
//! Handles the settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, BridgeSettings, ExportSettings, RenderSettings, ServerSettings, Settings,
    SettingsError, TransportKind, CONFIG_ENV_VAR,
};
