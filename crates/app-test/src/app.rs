//! Test Ant App construction.

use std::path::Path;

use serde_json::json;
use tracing::info;

use antengine_apps::access::AccessGate;
use antengine_apps::app::App;
use antengine_apps::hooks::definitions::DEFAULT_PRIORITY;
use antengine_apps::registry::AppFactory;
use antengine_core::result::AppResult;

use crate::callbacks::{AdminReport, DeclareMyself, EchoArguments, ReturnTestValue};

/// Name the app is enabled and discovered under.
pub const APP_NAME: &str = "Test Ant App";

/// Version reported by the app.
pub const APP_VERSION: &str = "1.0";

/// Feature guarding the `app-admin-report` hook.
pub const REPORT_FEATURE: &str = "view-report";

/// Builds the Test Ant App.
#[derive(Debug, Default)]
pub struct TestAppFactory;

impl TestAppFactory {
    /// Creates the factory.
    pub fn new() -> Self {
        Self
    }
}

impl AppFactory for TestAppFactory {
    fn name(&self) -> &str {
        APP_NAME
    }

    fn build(&self, path: &Path) -> AppResult<App> {
        let mut app = App::new(APP_NAME, APP_VERSION)
            .with_description("Provides the Test Ant App for commands in the CLI.")
            .with_path(path)
            .with_access(AccessGate::enforcing([REPORT_FEATURE]))
            .with_callback("declareMySelf", DeclareMyself)
            .with_callback("returnTestValue", ReturnTestValue)
            .with_callback("echoArguments", EchoArguments)
            .with_callback("adminReport", AdminReport);

        app.add_hook("cli-init", "declareMySelf", DEFAULT_PRIORITY, None);
        app.add_hook("app-hook-test", "returnTestValue", DEFAULT_PRIORITY, None);
        app.add_hook(
            "app-echo",
            "echoArguments",
            DEFAULT_PRIORITY,
            Some(json!({ "source": APP_NAME })),
        );
        app.add_gated_hook("app-admin-report", "adminReport", DEFAULT_PRIORITY, REPORT_FEATURE);

        info!(app = %APP_NAME, hooks = app.hook_table().len(), "Test app built");
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use antengine_apps::hooks::definitions::{CallbackOutcome, DispatchContext};
    use antengine_apps::hooks::table::hook_signature;
    use antengine_core::error::ErrorKind;

    #[test]
    fn test_build_registers_hooks() {
        let app = TestAppFactory::new().build(Path::new("apps/TestApp/app.toml")).unwrap();
        assert_eq!(app.name(), APP_NAME);
        assert_eq!(app.version(), APP_VERSION);
        assert!(app.uses_hook("app-hook-test"));
        assert!(app.uses_hook("cli-init"));
        assert!(!app.uses_hook("missing"));

        let entry = app.hook_table().entries_for("app-hook-test")[0];
        assert_eq!(
            entry.signature,
            hook_signature("app-hook-test", "returnTestValue", DEFAULT_PRIORITY)
        );
    }

    #[tokio::test]
    async fn test_hook_returns_test_value() {
        let app = TestAppFactory::new().build(Path::new("app.toml")).unwrap();
        let outcome = app
            .execute_hook("app-hook-test", &DispatchContext::permissive())
            .await
            .unwrap();
        match outcome {
            CallbackOutcome::Ok(result) => assert_eq!(result["test-value"], 7),
            CallbackOutcome::Failed(reason) => panic!("unexpected failure: {reason}"),
        }
    }

    #[tokio::test]
    async fn test_gated_hook_requires_user() {
        let app = TestAppFactory::new().build(Path::new("app.toml")).unwrap();
        let err = app
            .execute_hook("app-admin-report", &DispatchContext::permissive())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingSecurityContext);
    }
}
