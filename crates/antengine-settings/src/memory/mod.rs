//! In-memory settings backend.

pub mod store;

pub use store::MemorySettingsStore;
