//! In-memory settings store using the dashmap crate.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;
use tracing::debug;

use antengine_core::result::AppResult;
use antengine_core::traits::settings::{SettingsStore, SettingsUpdate};

/// In-process settings store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    /// Setting key → JSON value.
    entries: Arc<DashMap<String, Value>>,
}

impl MemorySettingsStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, key: &str) -> AppResult<Option<Value>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: Value) -> AppResult<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn update(&self, key: &str, apply: SettingsUpdate) -> AppResult<Option<Value>> {
        // The entry guard holds the shard lock for the whole read-modify-write.
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => match apply(Some(occupied.get().clone()))? {
                Some(value) => {
                    occupied.insert(value.clone());
                    Ok(Some(value))
                }
                None => {
                    occupied.remove();
                    debug!(key, "Setting removed by update");
                    Ok(None)
                }
            },
            Entry::Vacant(vacant) => match apply(None)? {
                Some(value) => {
                    vacant.insert(value.clone());
                    Ok(Some(value))
                }
                None => Ok(None),
            },
        }
    }
}
