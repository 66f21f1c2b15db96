//! Hook registration records, dispatch context and callback outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use antengine_core::error::{AppError, ErrorKind};
use antengine_core::types::{CurrentUser, RequestInfo};

use super::table::hook_signature;

/// Priority used when a hook is added without one.
pub const DEFAULT_PRIORITY: i32 = 50;
/// Earliest priority.
pub const MIN_PRIORITY: i32 = 1;
/// Latest priority.
pub const MAX_PRIORITY: i32 = 100;

/// Clamps a requested priority into [`MIN_PRIORITY`, `MAX_PRIORITY`].
pub fn clamp_priority(priority: i32) -> i32 {
    priority.clamp(MIN_PRIORITY, MAX_PRIORITY)
}

/// Mapping of result keys to values returned by every hook callback.
pub type ResultMap = Map<String, Value>;

/// One `(hook, callback, priority)` registration owned by an app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookRegistration {
    /// Deterministic identifier derived from hook, callback and priority.
    pub signature: String,
    /// Extension point name.
    pub hook: String,
    /// Identifier of the callback in the owning app's dispatch table.
    pub callback: String,
    /// Lower fires earlier.
    pub priority: i32,
    /// Static payload handed to the callback on every invocation.
    pub arguments: Option<Value>,
    /// Declared feature the caller must be granted before this entry runs.
    pub feature: Option<String>,
}

impl HookRegistration {
    /// Creates a registration. Priorities outside [1, 100] are clamped.
    pub fn new(hook: &str, callback: &str, priority: i32) -> Self {
        let clamped = clamp_priority(priority);
        if clamped != priority {
            tracing::warn!(
                hook = %hook,
                callback = %callback,
                requested = priority,
                priority = clamped,
                "Hook priority out of range, clamped"
            );
        }

        Self {
            signature: hook_signature(hook, callback, clamped),
            hook: hook.to_string(),
            callback: callback.to_string(),
            priority: clamped,
            arguments: None,
            feature: None,
        }
    }

    /// Attaches static arguments.
    pub fn with_arguments(mut self, arguments: Value) -> Self {
        self.arguments = Some(arguments);
        self
    }

    /// Gates this entry behind a declared access-control feature.
    pub fn requires_feature(mut self, feature: &str) -> Self {
        self.feature = Some(feature.to_string());
        self
    }
}

/// Everything a callback sees about the trigger it runs in.
///
/// Built by the host per request or command and passed by reference through
/// the dispatch chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchContext {
    /// Identifier of this trigger, for log correlation.
    pub id: Uuid,
    /// The request being served.
    pub request: RequestInfo,
    /// The authenticated caller, when there is one.
    pub current_user: Option<CurrentUser>,
    /// Caller-supplied arguments.
    pub args: Option<Value>,
    /// When the context was built.
    pub timestamp: DateTime<Utc>,
}

impl DispatchContext {
    /// Creates a context for the given request.
    pub fn new(request: RequestInfo) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            current_user: None,
            args: None,
            timestamp: Utc::now(),
        }
    }

    /// A context with an empty URI and no request variables.
    pub fn permissive() -> Self {
        Self::new(RequestInfo::default())
    }

    /// Sets the current user.
    pub fn with_user(mut self, user: CurrentUser) -> Self {
        self.current_user = Some(user);
        self
    }

    /// Sets caller-supplied arguments.
    pub fn with_args(mut self, args: Value) -> Self {
        self.args = Some(args);
        self
    }

    /// Requested URI.
    pub fn uri(&self) -> &str {
        &self.request.uri
    }
}

/// Why a callback invocation was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FailureReason {
    /// The callback returned a value that is not a JSON object.
    #[error("callback '{callback}' returned {returned} instead of a result map")]
    ContractViolation {
        /// Callback identifier.
        callback: String,
        /// JSON type of the offending value.
        returned: String,
    },
    /// The callback returned an error or panicked.
    #[error("callback '{callback}' failed: {message}")]
    CallbackFailure {
        /// Callback identifier.
        callback: String,
        /// Error or panic message.
        message: String,
    },
    /// The hook table names a callback missing from the dispatch table.
    #[error("callback '{callback}' is not registered")]
    UnknownCallback {
        /// Callback identifier.
        callback: String,
    },
}

impl FailureReason {
    /// Builds a contract violation describing the value's JSON type.
    pub fn contract_violation(callback: &str, returned: &Value) -> Self {
        let returned = match returned {
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::String(_) => "a string",
            Value::Array(_) => "an array",
            Value::Object(_) => "an object",
        };
        Self::ContractViolation {
            callback: callback.to_string(),
            returned: returned.to_string(),
        }
    }
}

impl From<FailureReason> for AppError {
    fn from(reason: FailureReason) -> Self {
        let kind = match reason {
            FailureReason::ContractViolation { .. } => ErrorKind::ContractViolation,
            FailureReason::CallbackFailure { .. } | FailureReason::UnknownCallback { .. } => {
                ErrorKind::CallbackFailure
            }
        };
        AppError::new(kind, reason.to_string())
    }
}

/// Result of invoking one callback, or all of an app's callbacks for a hook.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutcome {
    /// The merged result map.
    Ok(ResultMap),
    /// The invocation failed; nothing it produced is merged.
    Failed(FailureReason),
}

impl CallbackOutcome {
    /// Whether the invocation failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Merges `incoming` into `into`; on key collision the incoming value wins.
pub fn merge_results(into: &mut ResultMap, incoming: ResultMap) {
    for (key, value) in incoming {
        into.insert(key, value);
    }
}
