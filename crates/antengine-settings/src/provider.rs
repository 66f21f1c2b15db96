//! Settings manager that dispatches to the configured backend.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use antengine_core::config::SettingsConfig;
use antengine_core::error::AppError;
use antengine_core::result::AppResult;
use antengine_core::traits::settings::{SettingsStore, SettingsUpdate};

/// Settings manager that wraps the configured settings backend.
///
/// The backend is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct SettingsManager {
    /// The inner settings store.
    inner: Arc<dyn SettingsStore>,
}

impl SettingsManager {
    /// Create a new settings manager from configuration.
    pub fn new(config: &SettingsConfig) -> AppResult<Self> {
        let inner: Arc<dyn SettingsStore> = match config.provider.as_str() {
            #[cfg(feature = "file")]
            "file" => {
                info!(path = %config.path, "Initializing file settings store");
                Arc::new(crate::file::FileSettingsStore::new(&config.path))
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory settings store");
                Arc::new(crate::memory::MemorySettingsStore::new())
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown settings provider: '{other}'. Supported: memory, file"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Create a settings manager from an existing store (for testing).
    pub fn from_store(store: Arc<dyn SettingsStore>) -> Self {
        Self { inner: store }
    }

    /// Get a reference to the inner store.
    pub fn store(&self) -> &dyn SettingsStore {
        self.inner.as_ref()
    }
}

#[async_trait]
impl SettingsStore for SettingsManager {
    async fn get(&self, key: &str) -> AppResult<Option<Value>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> AppResult<()> {
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.inner.delete(key).await
    }

    async fn update(&self, key: &str, apply: SettingsUpdate) -> AppResult<Option<Value>> {
        self.inner.update(key, apply).await
    }
}
