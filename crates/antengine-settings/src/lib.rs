//! # antengine-settings
//!
//! Settings-store implementations for AntEngine. Supports two modes:
//!
//! - **memory**: In-process store backed by [dashmap](https://crates.io/crates/dashmap)
//! - **file**: A single JSON object file on disk
//!
//! The backend is selected at runtime based on configuration.

#[cfg(feature = "file")]
pub mod file;
pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;

pub use provider::SettingsManager;
