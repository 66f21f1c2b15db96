//! The authenticated caller, as seen by access control.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of the current user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Bypasses every feature check.
    Administrator,
    /// Regular account.
    User,
}

/// User on whose behalf a hook is triggered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Account identifier.
    pub id: Uuid,
    /// Login name.
    pub username: String,
    /// Role used by access control.
    pub role: Role,
}

impl CurrentUser {
    /// Creates a user with the given role.
    pub fn new(id: Uuid, username: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            username: username.into(),
            role,
        }
    }

    /// Returns whether the user is an administrator.
    pub fn is_administrator(&self) -> bool {
        self.role == Role::Administrator
    }
}
