//! App engine configuration.

use serde::{Deserialize, Serialize};

/// Settings for discovery, activation and dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Root directory scanned for `app.toml` manifests.
    #[serde(default = "default_app_root")]
    pub app_root: String,
    /// Initial verbosity inherited by every activated app (0 to 15).
    #[serde(default)]
    pub verbosity: u8,
    /// Settings key holding the enabled-apps mapping.
    #[serde(default = "default_enabled_apps_key")]
    pub enabled_apps_key: String,
    /// Options file read next to each app manifest during activation.
    #[serde(default = "default_app_options_file")]
    pub app_options_file: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_root: default_app_root(),
            verbosity: 0,
            enabled_apps_key: default_enabled_apps_key(),
            app_options_file: default_app_options_file(),
        }
    }
}

fn default_app_root() -> String {
    "./apps".to_string()
}

fn default_enabled_apps_key() -> String {
    "enabledAppsList".to_string()
}

fn default_app_options_file() -> String {
    "options.json".to_string()
}
