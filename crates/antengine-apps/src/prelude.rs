//! Prelude for convenient imports when writing apps.

pub use async_trait::async_trait;
pub use serde_json::{Value, json};

pub use antengine_core::error::AppError;
pub use antengine_core::result::AppResult;
pub use antengine_core::types::{CurrentUser, RequestInfo, Role};

pub use crate::access::AccessGate;
pub use crate::app::App;
pub use crate::hooks::callback::{ClosureCallback, HookCallback};
pub use crate::hooks::definitions::{DEFAULT_PRIORITY, DispatchContext, ResultMap};
pub use crate::registry::AppFactory;

pub use crate::result_map;
