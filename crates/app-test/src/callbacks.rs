//! Callbacks of the Test Ant App.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use antengine_apps::hooks::callback::HookCallback;
use antengine_apps::hooks::definitions::DispatchContext;
use antengine_core::result::AppResult;

use crate::app::APP_NAME;

/// Answers `cli-init` with the app's identity.
#[derive(Debug)]
pub struct DeclareMyself;

#[async_trait]
impl HookCallback for DeclareMyself {
    async fn call(&self, _ctx: &DispatchContext, _arguments: Option<&Value>) -> AppResult<Value> {
        debug!(app = %APP_NAME, "Declaring app");
        Ok(json!({ "success": true, "app": APP_NAME }))
    }
}

/// Answers `app-hook-test` with a fixed value.
#[derive(Debug)]
pub struct ReturnTestValue;

#[async_trait]
impl HookCallback for ReturnTestValue {
    async fn call(&self, _ctx: &DispatchContext, _arguments: Option<&Value>) -> AppResult<Value> {
        Ok(json!({ "test-value": 7 }))
    }
}

/// Echoes the registration's static arguments and the caller's arguments.
#[derive(Debug)]
pub struct EchoArguments;

#[async_trait]
impl HookCallback for EchoArguments {
    async fn call(&self, ctx: &DispatchContext, arguments: Option<&Value>) -> AppResult<Value> {
        Ok(json!({
            "static": arguments.cloned().unwrap_or(Value::Null),
            "args": ctx.args.clone().unwrap_or(Value::Null),
            "uri": ctx.uri(),
        }))
    }
}

/// Reports the calling user; registered behind the `view-report` feature.
#[derive(Debug)]
pub struct AdminReport;

#[async_trait]
impl HookCallback for AdminReport {
    async fn call(&self, ctx: &DispatchContext, _arguments: Option<&Value>) -> AppResult<Value> {
        let user = ctx
            .current_user
            .as_ref()
            .map(|user| user.username.clone())
            .unwrap_or_default();
        Ok(json!({ "report": "ok", "user": user }))
    }
}
