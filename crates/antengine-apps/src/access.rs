//! Optional per-app access control.

use std::collections::BTreeSet;

use tracing::{debug, error};

use antengine_core::error::AppError;
use antengine_core::result::AppResult;
use antengine_core::types::CurrentUser;

/// Access-control configuration of an app.
///
/// When disabled every check passes. When enabled, checks may only name
/// declared features and require a current user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessGate {
    /// Whether checks are enforced.
    has_acl: bool,
    /// Features that submit themselves to access control.
    features: BTreeSet<String>,
}

impl AccessGate {
    /// A disabled gate.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// An enforcing gate over the given features.
    pub fn enforcing<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            has_acl: true,
            features: features.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether checks are enforced.
    pub fn has_acl(&self) -> bool {
        self.has_acl
    }

    /// Declared features.
    pub fn features(&self) -> &BTreeSet<String> {
        &self.features
    }

    /// Declares another feature.
    pub fn declare(&mut self, feature: &str) {
        self.features.insert(feature.to_string());
    }

    /// Decides whether `user` may use `feature`.
    ///
    /// # Errors
    ///
    /// - `UnknownFeature` when enforcing and `feature` was never declared.
    /// - `MissingSecurityContext` when enforcing and no user is supplied.
    ///   This error is fatal: the caller must stop serving the request.
    pub fn check(&self, feature: &str, user: Option<&CurrentUser>) -> AppResult<bool> {
        if !self.has_acl {
            return Ok(true);
        }

        if !self.features.contains(feature) {
            return Err(AppError::unknown_feature(format!(
                "Feature '{feature}' is not declared in the app's feature list; \
                 cannot verify access to it"
            )));
        }

        let Some(user) = user else {
            error!(
                feature = %feature,
                "Access control enabled but no current user supplied; refusing to continue"
            );
            return Err(AppError::missing_security_context(format!(
                "Feature '{feature}' is access controlled but no current user was supplied"
            )));
        };

        if user.is_administrator() {
            return Ok(true);
        }

        // Per-feature grants for other roles are not defined; deny.
        debug!(
            feature = %feature,
            user = %user.username,
            "No grant rule for non-administrator, denying"
        );
        Ok(false)
    }
}
