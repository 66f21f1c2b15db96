//! # antengine-core
//!
//! Core crate for AntEngine. Contains the unified error system,
//! configuration schemas, the JSON configuration loader, the settings-store
//! contract and the request/user types passed through hook dispatch.
//!
//! This crate has **no** internal dependencies on other AntEngine crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
