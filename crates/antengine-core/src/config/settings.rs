//! Settings-store backend configuration.

use serde::{Deserialize, Serialize};

/// Selects and configures the settings-store backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Backend: `"memory"` or `"file"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// JSON file used by the `"file"` backend.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            path: default_path(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_path() -> String {
    "data/settings.json".to_string()
}
