//! Loader for JSON configuration files (per-app option files).

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::AppError;
use crate::result::AppResult;

/// A decoded JSON configuration file.
#[derive(Debug, Clone)]
pub struct JsonConfig {
    /// Where the configuration was read from.
    pub path: PathBuf,
    /// The decoded document.
    pub value: Value,
}

impl JsonConfig {
    /// Reads and decodes a JSON file.
    ///
    /// A missing file and malformed JSON both fail with a configuration
    /// error naming the path.
    pub async fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();

        let buffer = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::with_source(
                crate::error::ErrorKind::Configuration,
                format!("{} could not be read", path.display()),
                e,
            )
        })?;

        let value = serde_json::from_str(&buffer).map_err(|e| {
            AppError::with_source(
                crate::error::ErrorKind::Configuration,
                format!("{} is not valid JSON: {e}", path.display()),
                e,
            )
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            value,
        })
    }

    /// Consumes the loader and returns the decoded document.
    pub fn into_value(self) -> Value {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_load_decodes_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{"requestFilter":[{"GET":{"action":"upload"}}]}"#)
            .expect("write");

        let config = JsonConfig::load(&path).await.expect("load");
        assert_eq!(config.path, path);
        assert_eq!(config.value["requestFilter"][0]["GET"]["action"], "upload");
    }

    #[tokio::test]
    async fn test_missing_file_is_configuration_error() {
        let err = JsonConfig::load("/nonexistent/options.json")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert!(err.message.contains("/nonexistent/options.json"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_configuration_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").expect("write");

        let err = JsonConfig::load(&path).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
