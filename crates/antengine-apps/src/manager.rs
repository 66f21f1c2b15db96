//! App engine: the persisted enabled set, activation and hook dispatch.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use antengine_core::config::{EngineConfig, JsonConfig};
use antengine_core::error::AppError;
use antengine_core::result::AppResult;
use antengine_core::traits::{SettingsStore, boxed_update};

use crate::app::{App, TRACE_VERBOSITY};
use crate::discovery::{AppDiscovery, ManifestDiscovery};
use crate::hooks::definitions::{DispatchContext, FailureReason, ResultMap};
use crate::hooks::dispatcher::{FailureHandler, HookDispatcher};
use crate::registry::{AppFactory, AppFactoryRegistry};

/// Name under which the engine writes its own journal entries.
pub const ENGINE_LOG_NAME: &str = "AppEngine";

/// One line of the engine journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// App the message concerns.
    pub app: String,
    /// Message text.
    pub message: String,
    /// When it was logged.
    pub at: DateTime<Utc>,
}

/// Owns the activated apps and dispatches hooks across them.
#[derive(Debug)]
pub struct AppEngine {
    /// Engine configuration.
    config: EngineConfig,
    /// Persistent settings holding the enabled-apps mapping.
    settings: Arc<dyn SettingsStore>,
    /// App discovery.
    discovery: Arc<dyn AppDiscovery>,
    /// Compiled-in app factories.
    factories: Arc<AppFactoryRegistry>,
    /// Hook dispatcher.
    dispatcher: HookDispatcher,
    /// Last discovery result: app name → manifest path.
    available_apps: RwLock<BTreeMap<String, PathBuf>>,
    /// Activated apps, in activation order.
    activated: RwLock<Vec<Arc<App>>>,
    /// Verbosity inherited by activated apps.
    verbosity: AtomicU8,
    /// Engine journal.
    journal: RwLock<Vec<LogEntry>>,
    /// Held for the duration of a reload.
    reload_lock: Mutex<()>,
}

impl AppEngine {
    /// Creates an engine with manifest discovery. No app is activated yet.
    pub fn new(
        config: EngineConfig,
        settings: Arc<dyn SettingsStore>,
        factories: Arc<AppFactoryRegistry>,
    ) -> Self {
        let verbosity = AtomicU8::new(config.verbosity);
        Self {
            config,
            settings,
            discovery: Arc::new(ManifestDiscovery::new()),
            factories,
            dispatcher: HookDispatcher::new(),
            available_apps: RwLock::new(BTreeMap::new()),
            activated: RwLock::new(Vec::new()),
            verbosity,
            journal: RwLock::new(Vec::new()),
            reload_lock: Mutex::new(()),
        }
    }

    /// Replaces the discovery implementation.
    pub fn with_discovery(mut self, discovery: Arc<dyn AppDiscovery>) -> Self {
        self.discovery = discovery;
        self
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Factory registry.
    pub fn factories(&self) -> &Arc<AppFactoryRegistry> {
        &self.factories
    }

    /// Registers a compiled-in app factory.
    pub async fn register_factory(&self, factory: Arc<dyn AppFactory>) -> AppResult<()> {
        self.factories.register(factory).await
    }

    // ── Journal ──

    /// Logs `message` under `app`.
    pub async fn log(&self, app: &str, message: &str) {
        info!(app = %app, "{message}");
        self.journal.write().await.push(LogEntry {
            app: app.to_string(),
            message: message.to_string(),
            at: Utc::now(),
        });
    }

    /// Journal entries, oldest first.
    pub async fn logs(&self) -> Vec<LogEntry> {
        self.journal.read().await.clone()
    }

    // ── Discovery ──

    /// Rescans `app_root` and caches the result.
    pub async fn discover(&self) -> AppResult<BTreeMap<String, PathBuf>> {
        let discovery = Arc::clone(&self.discovery);
        let root = PathBuf::from(&self.config.app_root);
        let found = tokio::task::spawn_blocking(move || discovery.available_apps(&root))
            .await
            .map_err(|e| AppError::internal(format!("App discovery task failed: {e}")))??;
        debug!(root = %self.config.app_root, count = found.len(), "Apps discovered");
        *self.available_apps.write().await = found.clone();
        Ok(found)
    }

    /// Result of the last [`discover`](Self::discover).
    pub async fn available_apps(&self) -> BTreeMap<String, PathBuf> {
        self.available_apps.read().await.clone()
    }

    /// Reads a manifest field; see [`AppDiscovery::app_meta`].
    pub fn app_meta(
        &self,
        path: &Path,
        field: &str,
        pattern: Option<&str>,
    ) -> AppResult<Option<String>> {
        self.discovery.app_meta(path, field, pattern)
    }

    /// Reads the manifest's action list.
    pub fn app_actions(&self, path: &Path) -> AppResult<Vec<String>> {
        self.discovery.app_actions(path)
    }

    // ── Enabled set ──

    /// The persisted enabled-apps mapping.
    ///
    /// # Errors
    ///
    /// `Configuration` when the stored value is not a mapping of strings.
    pub async fn enabled_apps(&self) -> AppResult<BTreeMap<String, String>> {
        let stored = self.settings.get(&self.config.enabled_apps_key).await?;
        let entries = parse_enabled(stored)?;

        entries
            .into_iter()
            .map(|(name, path)| match path {
                Value::String(path) => Ok((name, path)),
                other => Err(AppError::configuration(format!(
                    "Enabled app '{name}' has a non-string path: {other}"
                ))),
            })
            .collect()
    }

    /// Adds `name → path` to the enabled set. Returns whether the entry
    /// was newly added.
    pub async fn enable_app(&self, name: &str, path: impl AsRef<Path>) -> AppResult<bool> {
        let added = Arc::new(AtomicBool::new(false));
        let name_owned = name.to_string();
        let path_owned = path.as_ref().to_string_lossy().into_owned();
        let flag = added.clone();

        self.settings
            .update(
                &self.config.enabled_apps_key,
                boxed_update(move |current| {
                    let mut entries = parse_enabled(current)?;
                    let previous = entries.insert(name_owned, Value::String(path_owned));
                    flag.store(previous.is_none(), Ordering::SeqCst);
                    Ok(Some(Value::Object(entries)))
                }),
            )
            .await?;

        let added = added.load(Ordering::SeqCst);
        info!(app = %name, added, "App enabled");
        Ok(added)
    }

    /// Removes `name` from the enabled set, leaving other entries intact.
    /// Returns whether the entry was present.
    pub async fn disable_app(&self, name: &str) -> AppResult<bool> {
        let removed = Arc::new(AtomicBool::new(false));
        let name_owned = name.to_string();
        let flag = removed.clone();

        self.settings
            .update(
                &self.config.enabled_apps_key,
                boxed_update(move |current| {
                    let mut entries = parse_enabled(current)?;
                    flag.store(entries.remove(&name_owned).is_some(), Ordering::SeqCst);
                    Ok(Some(Value::Object(entries)))
                }),
            )
            .await?;

        let removed = removed.load(Ordering::SeqCst);
        info!(app = %name, removed, "App disabled");
        Ok(removed)
    }

    // ── Activation ──

    /// Builds every enabled app and replaces the activated set.
    ///
    /// Apps that cannot be built are logged and skipped. Returns the number
    /// of activated apps.
    ///
    /// # Errors
    ///
    /// When the enabled set cannot be read, the activated set is left empty.
    pub async fn activate_apps(&self) -> AppResult<usize> {
        let enabled = match self.enabled_apps().await {
            Ok(enabled) => enabled,
            Err(e) => {
                self.activated.write().await.clear();
                error!(error = %e, "Enabled apps could not be read; no app is active");
                return Err(e);
            }
        };

        let mut activated = Vec::with_capacity(enabled.len());
        for (name, path) in &enabled {
            match self.activate_one(name, Path::new(path)).await {
                Ok(app) => activated.push(Arc::new(app)),
                Err(e) => {
                    warn!(app = %name, error = %e, "App activation failed");
                    self.log(name, &format!("Activation failed: {e}")).await;
                }
            }
        }

        let count = activated.len();
        *self.activated.write().await = activated;
        info!(count, "Apps activated");
        Ok(count)
    }

    async fn activate_one(&self, name: &str, path: &Path) -> AppResult<App> {
        let factory = self
            .factories
            .get(name)
            .await
            .ok_or_else(|| AppError::plugin(format!("No factory registered for app '{name}'")))?;

        let mut app = factory.build(path)?;
        if app.path().is_none() {
            app = app.with_path(path);
        }

        let options_path = path
            .parent()
            .map(|dir| dir.join(&self.config.app_options_file))
            .filter(|candidate| candidate.is_file());
        if let Some(options_path) = options_path {
            let options = JsonConfig::load(&options_path).await?;
            app.init(&options.value);
        }

        app.mark_loaded();
        app.set_enabled(true);
        app.set_verbosity(self.verbosity());

        debug!(app = %name, version = %app.version(), hooks = app.hook_table().len(), "App activated");
        Ok(app)
    }

    /// Re-reads the enabled set and re-activates every app.
    ///
    /// The activated set is cleared first, so a failed reload leaves no
    /// app active.
    pub async fn reload(&self) -> AppResult<usize> {
        let _guard = self.reload_lock.lock().await;
        self.activated.write().await.clear();
        self.activate_apps().await
    }

    /// Activated apps, in activation order.
    pub async fn activated_apps(&self) -> Vec<Arc<App>> {
        self.activated.read().await.clone()
    }

    /// An activated app by name.
    pub async fn app(&self, name: &str) -> Option<Arc<App>> {
        self.activated
            .read()
            .await
            .iter()
            .find(|app| app.name() == name)
            .cloned()
    }

    /// Activated apps that registered `hook`, in invocation order.
    pub async fn apps_with_hook(&self, hook: &str) -> Vec<Arc<App>> {
        let activated = self.activated.read().await;
        HookDispatcher::select(&activated, hook)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Signature of the first entry `app_name` registered for `hook`.
    pub async fn hook_key(&self, app_name: &str, hook: &str) -> Option<String> {
        let app = self.app(app_name).await?;
        app.hook_table()
            .entries_for(hook)
            .first()
            .map(|entry| entry.signature.clone())
    }

    /// Status of an activated app.
    pub async fn app_status(&self, name: &str) -> Option<&'static str> {
        self.app(name).await.map(|app| app.status())
    }

    // ── Verbosity ──

    /// Current engine verbosity.
    pub fn verbosity(&self) -> u8 {
        self.verbosity.load(Ordering::Relaxed)
    }

    /// Sets the engine verbosity and propagates it to every activated app.
    pub async fn set_verbosity(&self, level: u8) {
        self.verbosity.store(level, Ordering::Relaxed);
        for app in self.activated.read().await.iter() {
            app.set_verbosity(level);
        }
    }

    // ── Access & dispatch ──

    /// Runs the access gate of an activated app.
    pub async fn check_access(
        &self,
        app_name: &str,
        feature: &str,
        ctx: &DispatchContext,
    ) -> AppResult<bool> {
        let app = self
            .app(app_name)
            .await
            .ok_or_else(|| AppError::not_found(format!("App '{app_name}' is not activated")))?;
        app.check_acl(feature, ctx)
    }

    /// Fires `hook` on every eligible app and returns the merged result.
    ///
    /// Works on a snapshot of the activated set; apps disabled during the
    /// call still finish this dispatch.
    ///
    /// # Errors
    ///
    /// Only access-gate errors; callback failures disable the app instead.
    pub async fn trigger(&self, hook: &str, ctx: &DispatchContext) -> AppResult<ResultMap> {
        let snapshot = self.activated_apps().await;
        if self.verbosity() > TRACE_VERBOSITY {
            debug!(hook = %hook, context_id = %ctx.id, apps = snapshot.len(), "Trigger");
        }
        self.dispatcher.dispatch(&snapshot, hook, ctx, self).await
    }
}

#[async_trait]
impl FailureHandler for AppEngine {
    async fn app_failed(&self, app: &App, reason: &FailureReason) {
        let name = app.name();
        self.log(name, &reason.to_string()).await;
        self.log(name, "***DISABLING THIS APP***").await;

        if let Err(e) = self.disable_app(name).await {
            error!(app = %name, error = %e, "Failed app could not be disabled");
            self.log(name, &format!("Could not disable app: {e}")).await;
        }

        self.log(ENGINE_LOG_NAME, "Reloading app engine...").await;
        if let Err(e) = self.reload().await {
            error!(error = %e, "Reload after app failure failed");
            self.log(ENGINE_LOG_NAME, &format!("Reload failed: {e}")).await;
        }
    }
}

/// Accepts a mapping or a JSON-encoded mapping string; absent means empty.
fn parse_enabled(stored: Option<Value>) -> AppResult<Map<String, Value>> {
    match stored {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(entries)) => Ok(entries),
        Some(Value::String(encoded)) if encoded.trim().is_empty() => Ok(Map::new()),
        Some(Value::String(encoded)) => match serde_json::from_str(&encoded) {
            Ok(Value::Object(entries)) => Ok(entries),
            Ok(_) | Err(_) => Err(AppError::configuration(
                "Enabled apps list is not a JSON mapping",
            )),
        },
        Some(_) => Err(AppError::configuration(
            "Enabled apps list is not a JSON mapping",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use antengine_core::error::ErrorKind;
    use antengine_settings::memory::MemorySettingsStore;
    use antengine_settings::keys::ENABLED_APPS;
    use serde_json::json;

    use crate::hooks::callback::ClosureCallback;

    #[derive(Debug)]
    struct Fixed {
        name: &'static str,
        value: Value,
    }

    impl AppFactory for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn build(&self, _path: &Path) -> AppResult<App> {
            let value = self.value.clone();
            let mut app = App::new(self.name, "1.0")
                .with_callback("cb", ClosureCallback::sync("cb", move |_, _| Ok(value.clone())));
            app.add_hook("h", "cb", 50, None);
            Ok(app)
        }
    }

    async fn engine() -> (AppEngine, Arc<MemorySettingsStore>) {
        let store = Arc::new(MemorySettingsStore::new());
        let engine = AppEngine::new(
            EngineConfig::default(),
            store.clone(),
            Arc::new(AppFactoryRegistry::new()),
        );
        (engine, store)
    }

    #[test]
    fn test_parse_enabled_accepts_encoded_string() {
        let parsed = parse_enabled(Some(json!("{\"A\":\"/a\"}"))).unwrap();
        assert_eq!(parsed["A"], "/a");
        assert!(parse_enabled(None).unwrap().is_empty());
        assert!(parse_enabled(Some(json!([1]))).is_err());
    }

    #[tokio::test]
    async fn test_enable_disable_reports_changes() {
        let (engine, _) = engine().await;
        assert!(engine.enable_app("A", "/a/app.toml").await.unwrap());
        assert!(!engine.enable_app("A", "/a/app.toml").await.unwrap());
        assert!(engine.disable_app("A").await.unwrap());
        assert!(!engine.disable_app("A").await.unwrap());
    }

    #[tokio::test]
    async fn test_unparseable_enabled_list_fails_closed() {
        let (engine, store) = engine().await;
        engine
            .register_factory(Arc::new(Fixed { name: "A", value: json!({}) }))
            .await
            .unwrap();
        engine.enable_app("A", "/a/app.toml").await.unwrap();
        assert_eq!(engine.reload().await.unwrap(), 1);

        store.set(ENABLED_APPS, json!(17)).await.unwrap();
        let err = engine.reload().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert!(engine.activated_apps().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_factory_is_skipped() {
        let (engine, _) = engine().await;
        engine.enable_app("Ghost", "/ghost/app.toml").await.unwrap();
        assert_eq!(engine.reload().await.unwrap(), 0);
        assert!(engine.logs().await.iter().any(|entry| entry.app == "Ghost"));
    }

    #[tokio::test]
    async fn test_failure_disables_app() {
        let (engine, _) = engine().await;
        engine
            .register_factory(Arc::new(Fixed { name: "Bad", value: json!("nope") }))
            .await
            .unwrap();
        engine.enable_app("Bad", "/bad/app.toml").await.unwrap();
        engine.reload().await.unwrap();

        let result = engine
            .trigger("h", &DispatchContext::permissive())
            .await
            .unwrap();
        assert!(result.is_empty());
        assert!(engine.enabled_apps().await.unwrap().is_empty());
        assert!(engine.activated_apps().await.is_empty());
        assert!(
            engine
                .logs()
                .await
                .iter()
                .any(|entry| entry.message == "***DISABLING THIS APP***")
        );
    }

    #[tokio::test]
    async fn test_check_access_unknown_app() {
        let (engine, _) = engine().await;
        let err = engine
            .check_access("nobody", "f", &DispatchContext::permissive())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
