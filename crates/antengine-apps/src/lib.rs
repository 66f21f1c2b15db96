//! # antengine-apps
//!
//! App framework for AntEngine. Provides:
//!
//! - Per-app hook tables keyed by a deterministic registration signature
//! - URI and GET/POST request filtering deciding whether an app runs
//! - An access gate for feature-gated hook entries
//! - Manifest discovery and a factory registry for compiled-in apps
//! - The [`AppEngine`], which persists the enabled set, activates apps and
//!   dispatches hooks, disabling apps whose callbacks fail

pub mod access;
pub mod app;
pub mod discovery;
pub mod filter;
pub mod hooks;
pub mod macros;
pub mod manager;
pub mod prelude;
pub mod registry;

#[doc(hidden)]
pub use serde_json;

pub use access::AccessGate;
pub use app::{App, AppInfo};
pub use discovery::{AppDiscovery, ManifestDiscovery};
pub use filter::{RequestFilter, UriRegistry};
pub use hooks::callback::{ClosureCallback, HookCallback};
pub use hooks::definitions::{
    CallbackOutcome, DispatchContext, FailureReason, HookRegistration, ResultMap,
};
pub use hooks::dispatcher::{FailureHandler, HookDispatcher};
pub use hooks::table::{HookTable, hook_signature};
pub use manager::{AppEngine, LogEntry};
pub use registry::{AppFactory, AppFactoryRegistry};
