//! Settings persisted as one JSON object file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use antengine_core::error::{AppError, ErrorKind};
use antengine_core::result::AppResult;
use antengine_core::traits::settings::{SettingsStore, SettingsUpdate};

/// Settings store writing every change through to a JSON file.
///
/// All operations are serialised by one async mutex, which makes
/// [`SettingsStore::update`] a single read-modify-write of the file.
#[derive(Debug)]
pub struct FileSettingsStore {
    /// Location of the JSON document.
    path: PathBuf,
    /// Serialises access to the file.
    lock: Mutex<()>,
}

impl FileSettingsStore {
    /// Create a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> AppResult<Map<String, Value>> {
        let buffer = match tokio::fs::read_to_string(&self.path).await {
            Ok(buffer) => buffer,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        if buffer.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&buffer) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(AppError::configuration(format!(
                "Settings file '{}' must contain a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Configuration,
                format!("Settings file '{}' is not valid JSON", self.path.display()),
                e,
            )),
        }
    }

    async fn write_all(&self, entries: Map<String, Value>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(&Value::Object(entries))?;

        // Write beside the target and rename so readers never see a torn file.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), "Settings file written");
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(&self, key: &str) -> AppResult<Option<Value>> {
        let _guard = self.lock.lock().await;
        let entries = self.read_all().await?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value);
        self.write_all(entries).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_some() {
            self.write_all(entries).await?;
        }
        Ok(())
    }

    async fn update(&self, key: &str, apply: SettingsUpdate) -> AppResult<Option<Value>> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;

        let next = apply(entries.get(key).cloned())?;
        match &next {
            Some(value) => {
                entries.insert(key.to_string(), value.clone());
            }
            None => {
                entries.remove(key);
            }
        }

        self.write_all(entries).await?;
        Ok(next)
    }
}
