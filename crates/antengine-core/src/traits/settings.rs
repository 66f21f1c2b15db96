//! Settings-store contract used by the app-lifecycle manager.

use async_trait::async_trait;
use serde_json::Value;

use crate::result::AppResult;

/// Read-modify-write closure applied by [`SettingsStore::update`].
///
/// Receives the current value (if any) and returns the value to store;
/// returning `None` deletes the key.
pub type SettingsUpdate = Box<dyn FnOnce(Option<Value>) -> AppResult<Option<Value>> + Send>;

/// Key-value store of JSON settings keyed by string.
///
/// Backends must apply [`SettingsStore::update`] atomically with respect to
/// other calls on the same key, so that concurrent enable/disable requests
/// never lose each other's writes.
#[async_trait]
pub trait SettingsStore: Send + Sync + std::fmt::Debug + 'static {
    /// Get a value by key. Returns `None` if the key does not exist.
    async fn get(&self, key: &str) -> AppResult<Option<Value>>;

    /// Store a value, replacing any previous one.
    async fn set(&self, key: &str, value: Value) -> AppResult<()>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Atomically replace the value under `key` with the closure's output.
    ///
    /// Returns the value that was stored. If the closure fails nothing is
    /// written and the error is returned.
    async fn update(&self, key: &str, apply: SettingsUpdate) -> AppResult<Option<Value>>;
}

/// Boxes a closure as a [`SettingsUpdate`].
pub fn boxed_update<F>(apply: F) -> SettingsUpdate
where
    F: FnOnce(Option<Value>) -> AppResult<Option<Value>> + Send + 'static,
{
    Box::new(apply)
}
