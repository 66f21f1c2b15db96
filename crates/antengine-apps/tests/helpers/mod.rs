//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Value, json};
use tempfile::TempDir;

use antengine_apps::access::AccessGate;
use antengine_apps::app::App;
use antengine_apps::hooks::callback::ClosureCallback;
use antengine_apps::manager::AppEngine;
use antengine_apps::registry::{AppFactory, AppFactoryRegistry};
use antengine_core::config::EngineConfig;
use antengine_core::error::AppError;
use antengine_core::result::AppResult;
use antengine_core::traits::SettingsStore;
use antengine_settings::memory::MemorySettingsStore;

pub const HOOK_TEST_APP: &str = "Test Ant App";
pub const HOOK_TEST_CALLBACK: &str = "returnTestValue";

/// How a fixture callback misbehaves instead of returning its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Misbehaviour {
    Errors,
    Panics,
}

/// Builds an app with a single callback returning `value` for `hook`.
#[derive(Debug, Clone)]
pub struct FixtureApp {
    pub name: &'static str,
    pub hook: &'static str,
    pub callback: &'static str,
    pub priority: i32,
    pub value: Value,
    pub feature: Option<&'static str>,
    pub misbehaviour: Option<Misbehaviour>,
}

impl FixtureApp {
    pub fn new(name: &'static str, hook: &'static str, value: Value) -> Self {
        Self {
            name,
            hook,
            callback: "handle",
            priority: 50,
            value,
            feature: None,
            misbehaviour: None,
        }
    }

    pub fn callback(mut self, callback: &'static str) -> Self {
        self.callback = callback;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn gated(mut self, feature: &'static str) -> Self {
        self.feature = Some(feature);
        self
    }

    pub fn misbehave(mut self, misbehaviour: Misbehaviour) -> Self {
        self.misbehaviour = Some(misbehaviour);
        self
    }

    pub fn hook_test_app() -> Self {
        Self::new(HOOK_TEST_APP, "app-hook-test", json!({"test-value": 7}))
            .callback(HOOK_TEST_CALLBACK)
    }
}

impl AppFactory for FixtureApp {
    fn name(&self) -> &str {
        self.name
    }

    fn build(&self, path: &Path) -> AppResult<App> {
        let value = self.value.clone();
        let misbehaviour = self.misbehaviour;
        let name = self.name;
        let mut app = App::new(self.name, "1.0")
            .with_path(path)
            .with_callback(
                self.callback,
                ClosureCallback::sync(self.callback, move |_, _| match misbehaviour {
                    Some(Misbehaviour::Errors) => {
                        Err(AppError::internal(format!("{name} callback failed")))
                    }
                    Some(Misbehaviour::Panics) => panic!("{name} callback panicked"),
                    None => Ok(value.clone()),
                }),
            );

        match self.feature {
            Some(feature) => {
                app = app.with_access(AccessGate::enforcing([feature]));
                app.add_gated_hook(self.hook, self.callback, self.priority, feature);
            }
            None => {
                app.add_hook(self.hook, self.callback, self.priority, None);
            }
        }
        Ok(app)
    }
}

/// An engine over a temporary app root.
pub struct Harness {
    pub dir: TempDir,
    pub engine: AppEngine,
}

impl Harness {
    pub async fn new(factories: Vec<FixtureApp>) -> Self {
        Self::with_store(factories, Arc::new(MemorySettingsStore::new())).await
    }

    pub async fn with_store(factories: Vec<FixtureApp>, store: Arc<dyn SettingsStore>) -> Self {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig {
            app_root: dir.path().to_string_lossy().into_owned(),
            ..EngineConfig::default()
        };

        let registry = Arc::new(AppFactoryRegistry::new());
        for factory in factories {
            registry.register(Arc::new(factory)).await.unwrap();
        }

        Self {
            dir,
            engine: AppEngine::new(config, store, registry),
        }
    }

    /// Writes `<root>/<dir>/app.toml` and returns its path.
    pub fn manifest(&self, dir: &str, name: &str) -> PathBuf {
        let app_dir = self.dir.path().join(dir);
        fs::create_dir_all(&app_dir).unwrap();
        let path = app_dir.join("app.toml");
        fs::write(
            &path,
            format!(
                "name = \"{name}\"\n\
                 description = \"Fixture app {name}\"\n\
                 version = \"1.0\"\n\
                 actions = [\"one\", \"two\", \"three\"]\n\
                 namespace = \"AntEngine.Apps\"\n"
            ),
        )
        .unwrap();
        path
    }

    /// Writes a manifest, enables it and returns its path.
    pub async fn install(&self, dir: &str, name: &str) -> PathBuf {
        let path = self.manifest(dir, name);
        self.engine.enable_app(name, &path).await.unwrap();
        path
    }
}
