//! Convenience result type alias for AntEngine.

use crate::error::AppError;

/// A specialized `Result` type for AntEngine operations.
pub type AppResult<T> = Result<T, AppError>;
