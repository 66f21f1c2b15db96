//! Hook dispatcher across activated apps.
//!
//! For one trigger:
//! - Apps that registered the hook are selected and ordered by the lowest
//!   priority they registered for it, ties in activation order.
//! - Apps whose URI patterns or request filters exclude the request are
//!   skipped.
//! - Each remaining app runs its entries; successful results are merged,
//!   later apps overwriting earlier ones on shared keys.
//! - A failing app is handed to the [`FailureHandler`] and excluded from the
//!   merge. Dispatch then continues with the apps already selected.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use antengine_core::result::AppResult;

use crate::app::{App, TRACE_VERBOSITY};

use super::definitions::{
    CallbackOutcome, DispatchContext, FailureReason, ResultMap, merge_results,
};

/// Receives apps whose callbacks failed during dispatch.
#[async_trait]
pub trait FailureHandler: Send + Sync {
    /// Called once per failing app, before dispatch moves on.
    async fn app_failed(&self, app: &App, reason: &FailureReason);
}

/// Dispatches a hook across a set of activated apps.
#[derive(Debug, Default)]
pub struct HookDispatcher;

impl HookDispatcher {
    /// Creates a new hook dispatcher.
    pub fn new() -> Self {
        Self
    }

    /// Apps that registered `hook`, in invocation order.
    pub fn select<'a>(apps: &'a [Arc<App>], hook: &str) -> Vec<&'a Arc<App>> {
        let mut selected: Vec<(i32, usize, &Arc<App>)> = apps
            .iter()
            .enumerate()
            .filter_map(|(position, app)| {
                app.hook_table()
                    .lowest_priority(hook)
                    .map(|priority| (priority, position, app))
            })
            .collect();

        selected.sort_by_key(|(priority, position, _)| (*priority, *position));
        selected.into_iter().map(|(_, _, app)| app).collect()
    }

    /// Fires `hook` on every eligible app and returns the merged results.
    ///
    /// Callback failures never surface here; they go to `failures`.
    ///
    /// # Errors
    ///
    /// Only access-gate errors from feature-gated entries are returned.
    pub async fn dispatch(
        &self,
        apps: &[Arc<App>],
        hook: &str,
        ctx: &DispatchContext,
        failures: &dyn FailureHandler,
    ) -> AppResult<ResultMap> {
        let selected = Self::select(apps, hook);
        let mut merged = ResultMap::new();

        if selected.is_empty() {
            debug!(hook = %hook, "No activated app uses hook");
            return Ok(merged);
        }

        debug!(
            hook = %hook,
            context_id = %ctx.id,
            app_count = selected.len(),
            "Dispatching hook"
        );

        for app in selected {
            if !app.should_run(ctx) {
                continue;
            }

            let outcome = match app.execute_hook(hook, ctx).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(
                        app = %app.name(),
                        hook = %hook,
                        error = %e,
                        fatal = e.is_fatal(),
                        "Access check aborted dispatch"
                    );
                    return Err(e);
                }
            };

            match outcome {
                CallbackOutcome::Ok(result) => {
                    if app.verbosity() > TRACE_VERBOSITY {
                        debug!(app = %app.name(), hook = %hook, result = ?result, "App result");
                    }
                    merge_results(&mut merged, result);
                }
                CallbackOutcome::Failed(reason) => {
                    warn!(app = %app.name(), hook = %hook, %reason, "App failed during dispatch");
                    failures.app_failed(app, &reason).await;
                }
            }
        }

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::callback::ClosureCallback;
    use antengine_core::types::RequestInfo;
    use serde_json::{Value, json};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        failed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl FailureHandler for Recorder {
        async fn app_failed(&self, app: &App, _reason: &FailureReason) {
            self.failed.lock().await.push(app.name().to_string());
        }
    }

    fn app(name: &str, hook: &str, priority: i32, value: Value) -> Arc<App> {
        let mut app = App::new(name, "1.0")
            .with_callback("cb", ClosureCallback::sync("cb", move |_, _| Ok(value.clone())));
        app.add_hook(hook, "cb", priority, None);
        Arc::new(app)
    }

    #[test]
    fn test_select_orders_by_lowest_priority_then_position() {
        let apps = vec![
            app("late", "h", 80, json!({})),
            app("other-hook", "x", 1, json!({})),
            app("early", "h", 10, json!({})),
            app("tie", "h", 80, json!({})),
        ];
        let names: Vec<&str> = HookDispatcher::select(&apps, "h")
            .iter()
            .map(|app| app.name())
            .collect();
        assert_eq!(names, vec!["early", "late", "tie"]);
    }

    #[tokio::test]
    async fn test_dispatch_merges_across_apps() {
        let apps = vec![
            app("second", "h", 60, json!({"shared": "second", "b": 2})),
            app("first", "h", 10, json!({"shared": "first", "a": 1})),
        ];
        let recorder = Recorder::default();

        let result = HookDispatcher::new()
            .dispatch(&apps, "h", &DispatchContext::permissive(), &recorder)
            .await
            .unwrap();

        assert_eq!(result["shared"], "second");
        assert_eq!(result["a"], 1);
        assert_eq!(result["b"], 2);
        assert!(recorder.failed.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_failing_app_is_reported_and_excluded() {
        let apps = vec![
            app("good", "h", 10, json!({"good": true})),
            app("bad", "h", 20, json!(42)),
            app("after", "h", 30, json!({"after": true})),
        ];
        let recorder = Recorder::default();

        let result = HookDispatcher::new()
            .dispatch(&apps, "h", &DispatchContext::permissive(), &recorder)
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(*recorder.failed.lock().await, vec!["bad".to_string()]);
    }

    #[tokio::test]
    async fn test_ineligible_apps_are_skipped() {
        let mut restricted = App::new("restricted", "1.0")
            .with_callback("cb", ClosureCallback::sync("cb", |_, _| Ok(json!({"r": 1}))));
        restricted.add_hook("h", "cb", 50, None);
        restricted.register_uri([r"^/admin"]);
        let apps = vec![Arc::new(restricted), app("open", "h", 50, json!({"o": 1}))];

        let ctx = DispatchContext::new(RequestInfo::new("/public"));
        let result = HookDispatcher::new()
            .dispatch(&apps, "h", &ctx, &Recorder::default())
            .await
            .unwrap();
        assert!(result.contains_key("o"));
        assert!(!result.contains_key("r"));
    }
}
