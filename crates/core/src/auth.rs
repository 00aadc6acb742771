//! Authentication status as seen by the chat pages.
//!
//! The pages never manage credentials. They consume one [`AuthStatus`]
//! value before running any page logic.

use serde::{Deserialize, Serialize};

/// The user behind an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub username: String,
    pub display_name: String,
}

/// Result of resolving a session's authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    /// No login has been attempted in this session.
    NotAttempted,
    /// A login was attempted and rejected, or the session token is invalid.
    Failed,
    Succeeded(AuthenticatedUser),
}

impl AuthStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            Self::Succeeded(user) => Some(user),
            _ => None,
        }
    }
}
