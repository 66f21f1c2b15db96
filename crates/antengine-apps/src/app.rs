//! The app: the unit of extension owning hooks, filters and access control.

use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use antengine_core::result::AppResult;

use crate::access::AccessGate;
use crate::filter::{RequestFilter, UriRegistry};
use crate::hooks::callback::HookCallback;
use crate::hooks::definitions::{
    CallbackOutcome, DispatchContext, FailureReason, HookRegistration, ResultMap, merge_results,
};
use crate::hooks::table::HookTable;

/// Verbosity above which hook-level detail is logged.
pub const TRACE_VERBOSITY: u8 = 14;

/// Verbosity `App::log` requires unless told otherwise.
pub const DEFAULT_LOG_VERBOSITY: u8 = 10;

/// Descriptive metadata about an app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    /// Unique app name.
    pub name: String,
    /// Version string.
    pub version: String,
    /// Human-readable description.
    pub description: String,
    /// Where the app definition was found.
    pub path: Option<PathBuf>,
}

/// A plugin unit: hook registrations plus the callbacks they name.
///
/// Registration state is mutated only while the app is being built; once
/// activated the engine shares it read-only.
#[derive(Debug)]
pub struct App {
    /// Metadata.
    info: AppInfo,
    /// Hook registrations.
    hooks: HookTable,
    /// Dispatch table: callback identifier → callback.
    callbacks: HashMap<String, Arc<dyn HookCallback>>,
    /// URI restriction.
    uris: UriRegistry,
    /// GET/POST restriction.
    request_filter: RequestFilter,
    /// Access control.
    access: AccessGate,
    /// Set once construction succeeded.
    loaded: bool,
    /// Set when activated from the enabled set.
    enabled: bool,
    /// Debug output level.
    verbosity: AtomicU8,
    /// Errors recorded during this session.
    errors: RwLock<Vec<String>>,
    /// Buffered console output.
    console_messages: RwLock<Vec<String>>,
}

impl App {
    /// Creates an app with no hooks.
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            info: AppInfo {
                name: name.to_string(),
                version: version.to_string(),
                description: String::new(),
                path: None,
            },
            hooks: HookTable::new(),
            callbacks: HashMap::new(),
            uris: UriRegistry::new(),
            request_filter: RequestFilter::new(),
            access: AccessGate::disabled(),
            loaded: false,
            enabled: false,
            verbosity: AtomicU8::new(0),
            errors: RwLock::new(Vec::new()),
            console_messages: RwLock::new(Vec::new()),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.info.description = description.to_string();
        self
    }

    /// Sets the origin path.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.info.path = Some(path.into());
        self
    }

    /// Sets the access-control configuration.
    pub fn with_access(mut self, access: AccessGate) -> Self {
        self.access = access;
        self
    }

    /// App name.
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// App version.
    pub fn version(&self) -> &str {
        &self.info.version
    }

    /// Origin path, if known.
    pub fn path(&self) -> Option<&Path> {
        self.info.path.as_deref()
    }

    /// Full metadata.
    pub fn info(&self) -> &AppInfo {
        &self.info
    }

    /// `"Loaded"` once construction succeeded, `"Available"` otherwise.
    pub fn status(&self) -> &'static str {
        if self.loaded { "Loaded" } else { "Available" }
    }

    /// Whether construction succeeded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Whether the app was activated from the enabled set.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Marks construction as complete.
    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    /// Sets the enabled flag.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Current verbosity.
    pub fn verbosity(&self) -> u8 {
        self.verbosity.load(Ordering::Relaxed)
    }

    /// Sets the verbosity. The app owns no sub-objects to propagate to.
    pub fn set_verbosity(&self, level: u8) {
        self.verbosity.store(level, Ordering::Relaxed);
    }

    // ── Registration ──

    /// Restricts the app to URIs matching any of `patterns`.
    ///
    /// Returns `true` iff at least one pattern was added.
    pub fn register_uri<I, S>(&mut self, patterns: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.uris.register(patterns)
    }

    /// Adds a hook and returns its signature.
    pub fn add_hook(
        &mut self,
        hook: &str,
        callback: &str,
        priority: i32,
        arguments: Option<Value>,
    ) -> String {
        self.hooks.register(hook, callback, priority, arguments)
    }

    /// Adds a hook that only runs for callers granted `feature`.
    pub fn add_gated_hook(
        &mut self,
        hook: &str,
        callback: &str,
        priority: i32,
        feature: &str,
    ) -> String {
        self.hooks
            .insert(HookRegistration::new(hook, callback, priority).requires_feature(feature))
    }

    /// Inserts a prepared registration and returns its signature.
    pub fn add_registration(&mut self, registration: HookRegistration) -> String {
        self.hooks.insert(registration)
    }

    /// Adds a callback to the dispatch table, replacing one of the same name.
    pub fn register_callback(&mut self, name: &str, callback: Arc<dyn HookCallback>) {
        self.callbacks.insert(name.to_string(), callback);
    }

    /// Builder-style [`App::register_callback`].
    pub fn with_callback(mut self, name: &str, callback: impl HookCallback + 'static) -> Self {
        self.register_callback(name, Arc::new(callback));
        self
    }

    /// Applies an options document (currently its `requestFilter`).
    pub fn init(&mut self, options: &Value) {
        self.request_filter.configure_from_options(options);
        debug!(
            app = %self.info.name,
            get_filters = self.request_filter.get_filters().len(),
            post_filters = self.request_filter.post_filters().len(),
            "App options applied"
        );
    }

    /// Replaces the request filters.
    pub fn set_request_filter(
        &mut self,
        get_vars: BTreeMap<String, String>,
        post_vars: BTreeMap<String, String>,
    ) {
        self.request_filter.configure(get_vars, post_vars);
    }

    // ── Queries ──

    /// Whether the app registered `hook`.
    pub fn uses_hook(&self, hook: &str) -> bool {
        self.hooks.uses_hook(hook)
    }

    /// The hook table.
    pub fn hook_table(&self) -> &HookTable {
        &self.hooks
    }

    /// The URI registry.
    pub fn uri_registry(&self) -> &UriRegistry {
        &self.uris
    }

    /// The request filter.
    pub fn request_filter(&self) -> &RequestFilter {
        &self.request_filter
    }

    /// The access gate.
    pub fn access_gate(&self) -> &AccessGate {
        &self.access
    }

    /// Whether the app fires on `uri`.
    pub fn fire_on_uri(&self, uri: &str) -> bool {
        self.uris.matches(uri)
    }

    /// URI match and request-filter match.
    ///
    /// Access control is not part of eligibility; it runs per feature.
    pub fn should_run(&self, ctx: &DispatchContext) -> bool {
        if !self.fire_on_uri(ctx.uri()) {
            debug!(app = %self.info.name, uri = %ctx.uri(), "App does not fire on URI");
            return false;
        }

        if !self.request_filter.permits(&ctx.request) {
            debug!(app = %self.info.name, "Request filters exclude app");
            return false;
        }

        true
    }

    /// Runs the access gate for `feature` with the context's user.
    pub fn check_acl(&self, feature: &str, ctx: &DispatchContext) -> AppResult<bool> {
        self.access.check(feature, ctx.current_user.as_ref())
    }

    // ── Execution ──

    /// Invokes one callback from the dispatch table.
    ///
    /// Errors, panics and non-object results are reported as
    /// [`CallbackOutcome::Failed`].
    pub async fn invoke(
        &self,
        callback: &str,
        ctx: &DispatchContext,
        arguments: Option<&Value>,
    ) -> CallbackOutcome {
        let Some(handler) = self.callbacks.get(callback) else {
            return CallbackOutcome::Failed(FailureReason::UnknownCallback {
                callback: callback.to_string(),
            });
        };

        let result = AssertUnwindSafe(handler.call(ctx, arguments))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(Value::Object(map))) => CallbackOutcome::Ok(map),
            Ok(Ok(other)) => {
                CallbackOutcome::Failed(FailureReason::contract_violation(callback, &other))
            }
            Ok(Err(e)) => CallbackOutcome::Failed(FailureReason::CallbackFailure {
                callback: callback.to_string(),
                message: e.to_string(),
            }),
            Err(panic) => CallbackOutcome::Failed(FailureReason::CallbackFailure {
                callback: callback.to_string(),
                message: format!("panicked: {}", panic_message(panic.as_ref())),
            }),
        }
    }

    /// Runs every registration for `hook` in priority order and merges the
    /// results, later entries overwriting earlier ones on shared keys.
    ///
    /// The first failing callback stops the app and discards its partial
    /// result. Feature-gated entries denied by the access gate are skipped.
    ///
    /// # Errors
    ///
    /// Access-gate errors (`UnknownFeature`, `MissingSecurityContext`) are
    /// not contained and are returned to the caller.
    pub async fn execute_hook(
        &self,
        hook: &str,
        ctx: &DispatchContext,
    ) -> AppResult<CallbackOutcome> {
        let verbose = self.verbosity() > TRACE_VERBOSITY;
        if verbose {
            debug!(
                app = %self.info.name,
                hook = %hook,
                available = ?self.hooks.hook_names(),
                "Triggering hooks for app"
            );
        }

        let mut merged = ResultMap::new();

        for entry in self.hooks.entries_for(hook) {
            if let Some(feature) = &entry.feature {
                if !self.check_acl(feature, ctx)? {
                    debug!(
                        app = %self.info.name,
                        hook = %hook,
                        feature = %feature,
                        "Access denied, skipping hook entry"
                    );
                    continue;
                }
            }

            match self.invoke(&entry.callback, ctx, entry.arguments.as_ref()).await {
                CallbackOutcome::Ok(result) => {
                    if verbose {
                        debug!(
                            app = %self.info.name,
                            callback = %entry.callback,
                            result = ?result,
                            "Callback result"
                        );
                    }
                    merge_results(&mut merged, result);
                }
                CallbackOutcome::Failed(reason) => {
                    warn!(app = %self.info.name, hook = %hook, %reason, "Callback failed");
                    self.record_error(reason.to_string()).await;
                    return Ok(CallbackOutcome::Failed(reason));
                }
            }
        }

        Ok(CallbackOutcome::Ok(merged))
    }

    // ── Session diagnostics ──

    /// Records an error for this session.
    pub async fn record_error(&self, message: String) {
        self.errors.write().await.push(message);
    }

    /// Errors recorded this session.
    pub async fn errors(&self) -> Vec<String> {
        self.errors.read().await.clone()
    }

    /// Buffers a console message.
    pub async fn console_log(&self, message: &str) {
        self.console_messages.write().await.push(message.to_string());
    }

    /// Buffers `message` when verbosity is at least `minimum_verbosity`.
    pub async fn log(&self, message: &str, minimum_verbosity: u8) {
        if self.verbosity() >= minimum_verbosity {
            self.console_log(message).await;
        }
    }

    /// Drains buffered console messages as non-empty lines.
    pub async fn dump_messages(&self) -> Vec<String> {
        let messages = std::mem::take(&mut *self.console_messages.write().await);
        messages
            .iter()
            .flat_map(|message| message.lines())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::callback::ClosureCallback;
    use antengine_core::error::{AppError, ErrorKind};
    use antengine_core::types::{CurrentUser, RequestInfo, Role};
    use serde_json::json;
    use uuid::Uuid;

    fn returning(value: Value) -> ClosureCallback {
        ClosureCallback::sync("fixed", move |_, _| Ok(value.clone()))
    }

    #[tokio::test]
    async fn test_merge_later_priority_wins() {
        let mut app = App::new("Merge", "1.0")
            .with_callback("ten", returning(json!({"a": 1, "from_ten": true})))
            .with_callback("twenty", returning(json!({"a": 2})));
        // Registered out of order on purpose.
        app.add_hook("h", "twenty", 20, None);
        app.add_hook("h", "ten", 10, None);

        let outcome = app
            .execute_hook("h", &DispatchContext::permissive())
            .await
            .unwrap();
        let CallbackOutcome::Ok(result) = outcome else {
            panic!("expected success");
        };
        assert_eq!(result["a"], 2);
        assert_eq!(result["from_ten"], true);
    }

    #[tokio::test]
    async fn test_static_arguments_reach_callback() {
        let mut app = App::new("Args", "1.0").with_callback(
            "echo",
            ClosureCallback::sync("echo", |_, args| Ok(json!({"args": args.cloned()}))),
        );
        app.add_hook("h", "echo", 50, Some(json!({"mode": "static"})));

        let outcome = app
            .execute_hook("h", &DispatchContext::permissive())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CallbackOutcome::Ok(json!({"args": {"mode": "static"}}).as_object().cloned().unwrap())
        );
    }

    #[tokio::test]
    async fn test_non_object_is_contract_violation() {
        let mut app = App::new("Bad", "1.0").with_callback("cb", returning(json!("ok")));
        app.add_hook("h", "cb", 50, None);

        let outcome = app
            .execute_hook("h", &DispatchContext::permissive())
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            CallbackOutcome::Failed(FailureReason::ContractViolation { .. })
        ));
        assert_eq!(app.errors().await.len(), 1);
    }

    #[tokio::test]
    async fn test_error_and_panic_are_callback_failures() {
        let mut app = App::new("Failing", "1.0")
            .with_callback(
                "err",
                ClosureCallback::sync("err", |_, _| Err(AppError::internal("boom"))),
            )
            .with_callback(
                "panic",
                ClosureCallback::sync("panic", |_, _| panic!("callback exploded")),
            );
        app.add_hook("errors", "err", 50, None);
        app.add_hook("panics", "panic", 50, None);

        let ctx = DispatchContext::permissive();
        match app.execute_hook("errors", &ctx).await.unwrap() {
            CallbackOutcome::Failed(FailureReason::CallbackFailure { message, .. }) => {
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        match app.execute_hook("panics", &ctx).await.unwrap() {
            CallbackOutcome::Failed(FailureReason::CallbackFailure { message, .. }) => {
                assert!(message.contains("callback exploded"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failure_discards_partial_result() {
        let mut app = App::new("Partial", "1.0")
            .with_callback("good", returning(json!({"a": 1})))
            .with_callback("bad", returning(json!([1, 2])));
        app.add_hook("h", "good", 10, None);
        app.add_hook("h", "bad", 20, None);

        let outcome = app
            .execute_hook("h", &DispatchContext::permissive())
            .await
            .unwrap();
        assert!(outcome.is_failed());
    }

    #[tokio::test]
    async fn test_unknown_callback_fails() {
        let mut app = App::new("Missing", "1.0");
        app.add_hook("h", "nowhere", 50, None);
        let outcome = app
            .execute_hook("h", &DispatchContext::permissive())
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            CallbackOutcome::Failed(FailureReason::UnknownCallback { .. })
        ));
    }

    #[test]
    fn test_fire_on_uri_and_should_run() {
        let mut app = App::new("Uri", "1.0");
        assert!(app.fire_on_uri(""));
        assert!(app.register_uri([r"^/upload/"]));
        assert!(app.fire_on_uri("/upload/a"));
        assert!(!app.fire_on_uri("/download/a"));

        let mut get = BTreeMap::new();
        get.insert("action".to_string(), "go".to_string());
        app.set_request_filter(get, BTreeMap::new());

        let matching = DispatchContext::new(RequestInfo::new("/upload/a").with_get("action", "go"));
        let wrong_uri = DispatchContext::new(RequestInfo::new("/x").with_get("action", "go"));
        let wrong_var = DispatchContext::new(RequestInfo::new("/upload/a"));
        assert!(app.should_run(&matching));
        assert!(!app.should_run(&wrong_uri));
        assert!(!app.should_run(&wrong_var));
    }

    #[tokio::test]
    async fn test_gated_entry_follows_access_gate() {
        let mut app = App::new("Gated", "1.0")
            .with_access(AccessGate::enforcing(["reports"]))
            .with_callback("open", returning(json!({"open": true})))
            .with_callback("report", returning(json!({"report": true})));
        app.add_hook("h", "open", 10, None);
        app.add_gated_hook("h", "report", 20, "reports");

        let admin = DispatchContext::permissive().with_user(CurrentUser::new(
            Uuid::new_v4(),
            "root",
            Role::Administrator,
        ));
        let user = DispatchContext::permissive().with_user(CurrentUser::new(
            Uuid::new_v4(),
            "bob",
            Role::User,
        ));

        let CallbackOutcome::Ok(result) = app.execute_hook("h", &admin).await.unwrap() else {
            panic!("expected success");
        };
        assert_eq!(result.len(), 2);

        let CallbackOutcome::Ok(result) = app.execute_hook("h", &user).await.unwrap() else {
            panic!("expected success");
        };
        assert_eq!(result.len(), 1);

        let err = app
            .execute_hook("h", &DispatchContext::permissive())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingSecurityContext);
    }

    #[tokio::test]
    async fn test_console_messages_respect_verbosity() {
        let app = App::new("Console", "1.0");
        app.log("hidden", DEFAULT_LOG_VERBOSITY).await;
        app.set_verbosity(12);
        app.log("shown\nsecond line\n", DEFAULT_LOG_VERBOSITY).await;
        app.console_log("direct").await;

        assert_eq!(
            app.dump_messages().await,
            vec!["shown", "second line", "direct"]
        );
        assert!(app.dump_messages().await.is_empty());
    }

    #[test]
    fn test_status_and_flags() {
        let mut app = App::new("Flags", "2.1").with_path("/apps/flags/app.toml");
        assert_eq!(app.status(), "Available");
        app.mark_loaded();
        app.set_enabled(true);
        assert_eq!(app.status(), "Loaded");
        assert!(app.is_enabled());
        assert_eq!(app.version(), "2.1");
        assert_eq!(app.path(), Some(Path::new("/apps/flags/app.toml")));
    }
}
