//! User identity as seen by the magic link flow.
//!
//! The identity store owns user records; this module only defines the shape
//! the flow reads: who the user is, whether their email is confirmed, whether
//! the account is locked out, and whether a second factor is required.

use crate::{Error, error::ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A unique, stable identifier for a specific user.
/// This value should be treated as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: &str) -> Self {
        UserId(id.to_string())
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Representation of a user account as returned by the identity store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    // The unique identifier for the user.
    pub id: UserId,

    // The email of the user.
    pub email: String,

    // When the user's email was confirmed. None means unconfirmed.
    pub email_verified_at: Option<DateTime<Utc>>,

    // Until when the account is locked out. None means not locked out.
    pub locked_out_until: Option<DateTime<Utc>>,

    // Whether a second factor is required after token verification.
    pub two_factor_enabled: bool,
}

impl User {
    pub fn builder() -> UserBuilder {
        UserBuilder::default()
    }

    /// Check if the user's email has been verified.
    pub fn is_email_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }

    /// Check if the account is currently locked out. Lockout is a timestamp
    /// compared lazily against the wall clock, not an actively cleared flag.
    pub fn is_locked_out(&self) -> bool {
        self.locked_out_until.is_some_and(|until| until > Utc::now())
    }
}

#[derive(Default)]
pub struct UserBuilder {
    id: Option<UserId>,
    email: Option<String>,
    email_verified_at: Option<DateTime<Utc>>,
    locked_out_until: Option<DateTime<Utc>>,
    two_factor_enabled: bool,
}

impl UserBuilder {
    pub fn id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn email(mut self, email: String) -> Self {
        self.email = Some(email);
        self
    }

    pub fn email_verified_at(mut self, email_verified_at: Option<DateTime<Utc>>) -> Self {
        self.email_verified_at = email_verified_at;
        self
    }

    pub fn locked_out_until(mut self, locked_out_until: Option<DateTime<Utc>>) -> Self {
        self.locked_out_until = locked_out_until;
        self
    }

    pub fn two_factor_enabled(mut self, two_factor_enabled: bool) -> Self {
        self.two_factor_enabled = two_factor_enabled;
        self
    }

    pub fn build(self) -> Result<User, Error> {
        Ok(User {
            id: self.id.ok_or(ValidationError::MissingField(
                "User ID is required".to_string(),
            ))?,
            email: self.email.ok_or(ValidationError::MissingField(
                "Email is required".to_string(),
            ))?,
            email_verified_at: self.email_verified_at,
            locked_out_until: self.locked_out_until,
            two_factor_enabled: self.two_factor_enabled,
        })
    }
}
