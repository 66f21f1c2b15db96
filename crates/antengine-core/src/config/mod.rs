//! Application configuration schemas.
//!
//! Configuration structs are deserialized from TOML files via the `config`
//! crate. Each sub-module represents a logical configuration section;
//! [`json`] holds the loader for per-app JSON option files.

pub mod engine;
pub mod json;
pub mod logging;
pub mod settings;

use serde::{Deserialize, Serialize};

pub use self::engine::EngineConfig;
pub use self::json::JsonConfig;
pub use self::logging::LoggingConfig;
pub use self::settings::SettingsConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// Top-level deserialization target for the merged configuration
/// (base file + environment overlay + `ANTENGINE__*` variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// App engine settings.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Settings-store backend.
    #[serde(default)]
    pub settings: SettingsConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// Merges the given file with an environment-specific overlay
    /// (`config/<env>.toml`, env taken from `ANTENGINE_ENV`) and environment
    /// variables prefixed with `ANTENGINE__`. Missing files are allowed; a
    /// file that exists but does not parse is an error.
    pub fn load(config_path: &str) -> Result<Self, AppError> {
        let env = std::env::var("ANTENGINE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("ANTENGINE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
