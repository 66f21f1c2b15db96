//! Well-known settings keys.
//!
//! Centralising key names makes it easy to find every setting the engine
//! persists.

/// Mapping `{appName: appPath}` of every enabled app.
pub const ENABLED_APPS: &str = "enabledAppsList";
