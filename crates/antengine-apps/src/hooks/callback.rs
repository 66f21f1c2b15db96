//! Callbacks an app exposes to its hook table.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use antengine_core::result::AppResult;

use super::definitions::DispatchContext;

/// A named unit of app behaviour invoked when a registered hook fires.
///
/// Implementations must return a JSON object; any other value is treated as
/// a contract violation by the dispatcher.
#[async_trait]
pub trait HookCallback: Send + Sync + std::fmt::Debug {
    /// Runs the callback with the trigger context and the registration's
    /// static arguments.
    async fn call(&self, ctx: &DispatchContext, arguments: Option<&Value>) -> AppResult<Value>;
}

type BoxedCallbackFn = Arc<
    dyn Fn(DispatchContext, Option<Value>) -> Pin<Box<dyn Future<Output = AppResult<Value>> + Send>>
        + Send
        + Sync,
>;

/// A closure-based callback for quick app assembly.
///
/// The closure receives owned copies of the context and static arguments.
pub struct ClosureCallback {
    /// Label shown in debug output.
    label: String,
    /// Callback function.
    handler: BoxedCallbackFn,
}

impl std::fmt::Debug for ClosureCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureCallback")
            .field("label", &self.label)
            .field("handler", &"<closure>")
            .finish()
    }
}

impl ClosureCallback {
    /// Creates a callback from an async closure.
    pub fn new<F, Fut>(label: &str, handler: F) -> Self
    where
        F: Fn(DispatchContext, Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Value>> + Send + 'static,
    {
        Self {
            label: label.to_string(),
            handler: Arc::new(
                move |ctx: DispatchContext,
                      arguments: Option<Value>|
                      -> Pin<Box<dyn Future<Output = AppResult<Value>> + Send>> {
                    Box::pin(handler(ctx, arguments))
                },
            ),
        }
    }

    /// Creates a callback from a synchronous closure.
    pub fn sync<F>(label: &str, handler: F) -> Self
    where
        F: Fn(&DispatchContext, Option<&Value>) -> AppResult<Value> + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        Self::new(label, move |ctx, arguments| {
            let handler = Arc::clone(&handler);
            async move { handler(&ctx, arguments.as_ref()) }
        })
    }
}

#[async_trait]
impl HookCallback for ClosureCallback {
    async fn call(&self, ctx: &DispatchContext, arguments: Option<&Value>) -> AppResult<Value> {
        (self.handler)(ctx.clone(), arguments.cloned()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_async_closure_receives_arguments() {
        let callback = ClosureCallback::new("echo", |_ctx, arguments| async move {
            Ok(json!({ "echo": arguments.unwrap_or(Value::Null) }))
        });

        let ctx = DispatchContext::permissive();
        let out = callback.call(&ctx, Some(&json!("static"))).await.unwrap();
        assert_eq!(out, json!({"echo": "static"}));
    }

    #[tokio::test]
    async fn test_sync_closure_sees_request() {
        let callback = ClosureCallback::sync("uri", |ctx, _| Ok(json!({ "uri": ctx.uri() })));

        let ctx = DispatchContext::new(antengine_core::types::RequestInfo::new("/upload/1"));
        let out = callback.call(&ctx, None).await.unwrap();
        assert_eq!(out, json!({"uri": "/upload/1"}));
    }
}
