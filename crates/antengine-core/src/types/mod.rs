//! Shared types passed across crate boundaries.

pub mod request;
pub mod user;

pub use request::RequestInfo;
pub use user::{CurrentUser, Role};
