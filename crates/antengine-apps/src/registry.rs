//! Factory registry of compiled-in apps the engine can activate by name.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use antengine_core::error::AppError;
use antengine_core::result::AppResult;

use crate::app::App;

/// Builds a fresh [`App`] instance for one activation.
pub trait AppFactory: Send + Sync + std::fmt::Debug {
    /// Name of the app this factory builds; matches the manifest name.
    fn name(&self) -> &str;

    /// Constructs the app found at `path`, registering its hooks and callbacks.
    fn build(&self, path: &Path) -> AppResult<App>;
}

/// Registry of every app factory known to this process.
#[derive(Debug, Default)]
pub struct AppFactoryRegistry {
    /// App name → factory.
    factories: RwLock<HashMap<String, Arc<dyn AppFactory>>>,
}

impl AppFactoryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory. Names must be unique.
    pub async fn register(&self, factory: Arc<dyn AppFactory>) -> AppResult<()> {
        let name = factory.name().to_string();
        let mut factories = self.factories.write().await;

        if factories.contains_key(&name) {
            return Err(AppError::validation(format!(
                "App factory '{name}' is already registered"
            )));
        }

        info!(app = %name, "Registering app factory");
        factories.insert(name, factory);
        Ok(())
    }

    /// Gets a factory by app name.
    pub async fn get(&self, name: &str) -> Option<Arc<dyn AppFactory>> {
        self.factories.read().await.get(name).cloned()
    }

    /// Checks whether a factory is registered.
    pub async fn contains(&self, name: &str) -> bool {
        self.factories.read().await.contains_key(name)
    }

    /// Registered app names, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use antengine_core::error::ErrorKind;

    #[derive(Debug)]
    struct Named(&'static str);

    impl AppFactory for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn build(&self, path: &Path) -> AppResult<App> {
            Ok(App::new(self.0, "1.0").with_path(path))
        }
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let registry = AppFactoryRegistry::new();
        registry.register(Arc::new(Named("B"))).await.unwrap();
        registry.register(Arc::new(Named("A"))).await.unwrap();

        assert!(registry.contains("A").await);
        assert_eq!(registry.names().await, vec!["A", "B"]);

        let app = registry
            .get("B")
            .await
            .unwrap()
            .build(Path::new("/apps/b/app.toml"))
            .unwrap();
        assert_eq!(app.name(), "B");
    }

    #[tokio::test]
    async fn test_duplicate_names_rejected() {
        let registry = AppFactoryRegistry::new();
        registry.register(Arc::new(Named("A"))).await.unwrap();
        let err = registry.register(Arc::new(Named("A"))).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
