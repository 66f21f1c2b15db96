//! App discovery: locating app definitions and reading their metadata.
//!
//! An app definition is an `app.toml` manifest:
//!
//! ```toml
//! name = "Test Ant App"
//! description = "Provides the Test Ant App for commands in the CLI."
//! version = "1.0"
//! actions = ["cli-init", "app-hook-test", "app-echo"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, warn};

use antengine_core::error::{AppError, ErrorKind};
use antengine_core::result::AppResult;

/// File name recognised as an app manifest.
pub const MANIFEST_FILE: &str = "app.toml";

/// Metadata field selecting regex extraction in [`AppDiscovery::app_meta`].
pub const CUSTOM_FIELD: &str = "custom";

/// Source of app definitions.
pub trait AppDiscovery: Send + Sync + std::fmt::Debug {
    /// All app definitions under `root`, as `{name: definition path}`.
    fn available_apps(&self, root: &Path) -> AppResult<BTreeMap<String, PathBuf>>;

    /// Reads one metadata field of the definition at `path`.
    ///
    /// For the `custom` field, `pattern` is applied to the raw definition and
    /// its last capture group (or the whole match) is returned.
    fn app_meta(&self, path: &Path, field: &str, pattern: Option<&str>)
    -> AppResult<Option<String>>;

    /// Actions (hook names) declared by the definition at `path`.
    fn app_actions(&self, path: &Path) -> AppResult<Vec<String>>;
}

/// Discovers apps from `app.toml` manifests on disk.
#[derive(Debug, Clone, Default)]
pub struct ManifestDiscovery;

impl ManifestDiscovery {
    /// Creates a manifest scanner.
    pub fn new() -> Self {
        Self
    }

    fn read_manifest(path: &Path) -> AppResult<config::Config> {
        config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Cannot read app manifest '{}'", path.display()),
                    e,
                )
            })
    }

    fn manifests_under(root: &Path) -> AppResult<Vec<PathBuf>> {
        let mut found = Vec::new();
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            for entry in std::fs::read_dir(&dir)? {
                let entry = entry?;
                // Symlinks are not followed, so a link cycle cannot loop the scan.
                let file_type = entry.file_type()?;
                if file_type.is_dir() {
                    pending.push(entry.path());
                } else if file_type.is_file() && entry.file_name() == MANIFEST_FILE {
                    found.push(entry.path());
                }
            }
        }

        found.sort();
        Ok(found)
    }
}

impl AppDiscovery for ManifestDiscovery {
    fn available_apps(&self, root: &Path) -> AppResult<BTreeMap<String, PathBuf>> {
        if !root.is_dir() {
            return Err(AppError::not_found(format!(
                "App root '{}' does not exist",
                root.display()
            )));
        }

        let mut apps = BTreeMap::new();

        for path in Self::manifests_under(root)? {
            match self.app_meta(&path, "name", None) {
                Ok(Some(name)) => {
                    debug!(app = %name, path = %path.display(), "App discovered");
                    if let Some(previous) = apps.insert(name.clone(), path.clone()) {
                        warn!(
                            app = %name,
                            kept = %path.display(),
                            dropped = %previous.display(),
                            "Duplicate app name"
                        );
                    }
                }
                Ok(None) => {
                    warn!(path = %path.display(), "App manifest has no name, skipping");
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Unreadable app manifest, skipping");
                }
            }
        }

        Ok(apps)
    }

    fn app_meta(
        &self,
        path: &Path,
        field: &str,
        pattern: Option<&str>,
    ) -> AppResult<Option<String>> {
        if field == CUSTOM_FIELD {
            let pattern = pattern.ok_or_else(|| {
                AppError::validation("The custom metadata field requires a pattern")
            })?;
            let regex = Regex::new(pattern)?;
            let text = std::fs::read_to_string(path)?;

            return Ok(regex.captures(&text).and_then(|caps| {
                caps.iter()
                    .skip(1)
                    .flatten()
                    .last()
                    .or_else(|| caps.get(0))
                    .map(|m| m.as_str().to_string())
            }));
        }

        let manifest = Self::read_manifest(path)?;
        match manifest.get_string(field) {
            Ok(value) => Ok(Some(value)),
            Err(config::ConfigError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn app_actions(&self, path: &Path) -> AppResult<Vec<String>> {
        let manifest = Self::read_manifest(path)?;
        let actions = match manifest.get_array("actions") {
            Ok(actions) => actions,
            Err(config::ConfigError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        actions
            .into_iter()
            .map(|value| value.into_string().map_err(AppError::from))
            .collect()
    }
}
