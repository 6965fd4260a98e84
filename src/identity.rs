//! Collaborator interfaces for the identity store and session issuance.
//!
//! The magic link flow never owns token storage or session state. Tokens are
//! minted and verified by the identity store under a purpose tag, and their
//! validity is tied to the account's security stamp: rotating the stamp
//! invalidates every outstanding token for that purpose at once. Sessions are
//! issued by a [`SessionAuthority`], which the flow only orchestrates.

use crate::{Error, User, UserId};
use async_trait::async_trait;

/// Identity store capability consumed by issuance and redemption.
///
/// `verify_token` must hold a token valid only while it is unexpired, was
/// generated for the same purpose, and the account's security stamp has not
/// rotated since generation. Implementations decide the token format; this
/// crate treats it as an opaque string.
#[async_trait]
pub trait IdentityStore: Send + Sync + 'static {
    /// Find a user by their identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error>;

    /// Find a user by email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error>;

    /// Mint a purpose-bound, time-limited token for the user.
    async fn generate_token(&self, user_id: &UserId, purpose: &str) -> Result<String, Error>;

    /// Check whether `token` is a valid, unexpired, purpose-matching,
    /// stamp-consistent token for the user.
    async fn verify_token(
        &self,
        user_id: &UserId,
        purpose: &str,
        token: &str,
    ) -> Result<bool, Error>;

    /// Rotate the account's security stamp, invalidating all outstanding
    /// tokens for every purpose.
    async fn rotate_security_stamp(&self, user_id: &UserId) -> Result<(), Error>;
}

/// Session issuance capability consumed by redemption.
#[async_trait]
pub trait SessionAuthority: Send + Sync + 'static {
    /// Establish a full session for the user.
    async fn sign_in(&self, user: &User, persistent: bool) -> Result<(), Error>;

    /// Establish a partial authenticated context scoped only to the
    /// second-factor challenge, not a full session.
    async fn begin_two_factor(&self, user: &User) -> Result<(), Error>;
}
