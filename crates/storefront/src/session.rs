//! Authentication session state.
//!
//! [`Session`] is the plain value persisted under the `auth` key. All of its
//! operations take the current time as an argument, so the type never reads a
//! clock or touches storage itself; [`crate::state::AppState`] supplies both.

use core::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use emporium_core::{UserId, UserRole};

/// Schema version of the persisted session blob.
pub const SESSION_SCHEMA_VERSION: u32 = 1;

/// Identity of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: UserRole,
}

impl UserIdentity {
    /// "First Last", trimmed.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Authentication state for one client.
///
/// Invariant: `is_authenticated` implies both `user` and `access_token` are set.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    is_authenticated: bool,
    user: Option<UserIdentity>,
    access_token: Option<String>,
    access_token_expires_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("is_authenticated", &self.is_authenticated)
            .field("user", &self.user)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("access_token_expires_at", &self.access_token_expires_at)
            .finish()
    }
}

impl Session {
    /// Start an authenticated session.
    pub fn login(&mut self, token: String, user: UserIdentity, now: DateTime<Utc>, ttl: TimeDelta) {
        *self = Self {
            is_authenticated: true,
            user: Some(user),
            access_token: Some(token),
            access_token_expires_at: Some(now + ttl),
        };
    }

    /// Clear every field. Idempotent.
    pub fn logout(&mut self) {
        *self = Self::default();
    }

    /// Install a refreshed token and recompute its expiry; identity is untouched.
    pub fn set_token(&mut self, token: String, now: DateTime<Utc>, ttl: TimeDelta) {
        self.access_token = Some(token);
        self.access_token_expires_at = Some(now + ttl);
    }

    /// Whether the access token must be refreshed before use.
    ///
    /// A session without an expiry counts as expired.
    #[must_use]
    pub fn is_access_token_expired(&self, now: DateTime<Utc>) -> bool {
        self.access_token_expires_at
            .is_none_or(|expires_at| now >= expires_at)
    }

    /// Patch the user's names after a profile edit. Returns `false` (and does
    /// nothing) when no user is present.
    pub fn update_names(&mut self, first_name: &str, last_name: &str) -> bool {
        let Some(user) = self.user.as_mut() else {
            return false;
        };
        first_name.clone_into(&mut user.first_name);
        last_name.clone_into(&mut user.last_name);
        true
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    #[must_use]
    pub const fn access_token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.access_token_expires_at
    }

    #[must_use]
    pub const fn user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.user.as_ref().map(|u| u.id)
    }

    #[must_use]
    pub fn user_email(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.email.as_str())
    }

    #[must_use]
    pub fn user_first_name(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.first_name.as_str())
    }

    #[must_use]
    pub fn user_last_name(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.last_name.as_str())
    }

    /// Whether the session satisfies its invariant.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        !self.is_authenticated || (self.user.is_some() && self.access_token.is_some())
    }
}
