//! Core trait definitions implemented by other crates.

pub mod settings;

pub use settings::{SettingsStore, SettingsUpdate, boxed_update};
