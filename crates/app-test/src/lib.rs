//! Test Ant App for AntEngine.
//!
//! A small compiled-in app used by the CLI and the integration tests. It
//! registers one hook per dispatch path: a plain result, static arguments
//! and a feature-gated entry.

pub mod app;
pub mod callbacks;

pub use app::{APP_NAME, TestAppFactory};
