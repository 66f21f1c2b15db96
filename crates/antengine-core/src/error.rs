//! Unified application error types for AntEngine.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// Input validation failed.
    Validation,
    /// An internal error occurred.
    Internal,
    /// A settings-store I/O error occurred.
    Storage,
    /// Configuration could not be loaded or parsed.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An app could not be built or activated.
    Plugin,
    /// A hook callback returned something other than a result map.
    ContractViolation,
    /// A hook callback failed while running.
    CallbackFailure,
    /// An access check named a feature the app never declared.
    UnknownFeature,
    /// Access control is enabled but no current user was supplied.
    MissingSecurityContext,
}

impl ErrorKind {
    /// Stable upper-case code, as printed in error messages.
    pub fn code(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Validation => "VALIDATION",
            Self::Internal => "INTERNAL",
            Self::Storage => "STORAGE",
            Self::Configuration => "CONFIGURATION",
            Self::Serialization => "SERIALIZATION",
            Self::Plugin => "PLUGIN",
            Self::ContractViolation => "CONTRACT_VIOLATION",
            Self::CallbackFailure => "CALLBACK_FAILURE",
            Self::UnknownFeature => "UNKNOWN_FEATURE",
            Self::MissingSecurityContext => "MISSING_SECURITY_CONTEXT",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The unified application error used throughout AntEngine.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a plugin (app activation) error.
    pub fn plugin(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Plugin, message)
    }

    /// Create a callback failure error.
    pub fn callback_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CallbackFailure, message)
    }

    /// Create an unknown-feature error.
    pub fn unknown_feature(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownFeature, message)
    }

    /// Create a missing-security-context error.
    pub fn missing_security_context(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingSecurityContext, message)
    }

    /// Whether the host must stop serving the current request.
    ///
    /// Only a missing security context is fatal: continuing would leave the
    /// authorization state ambiguous.
    pub fn is_fatal(&self) -> bool {
        self.kind == ErrorKind::MissingSecurityContext
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

impl From<regex::Error> for AppError {
    fn from(err: regex::Error) -> Self {
        Self::with_source(
            ErrorKind::Validation,
            format!("Invalid pattern: {err}"),
            err,
        )
    }
}
