//! JSON-file settings backend.

pub mod store;

pub use store::FileSettingsStore;
