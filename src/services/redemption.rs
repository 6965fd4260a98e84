//! Magic link redemption.
//!
//! Implements the verifier state machine: parameter checks, user lookup,
//! code decode, token verification against the identity store, eligibility
//! checks, and finally either a direct sign-in or a handoff to the
//! second-factor challenge. A malformed code and an unknown user id produce
//! the same rejection so a caller cannot tell which check failed.
//!
//! Replay protection hinges on rotating the security stamp before control is
//! handed onward in both success branches. On the two-factor branch the
//! stamp rotates before the partial sign-in, closing the window in which a
//! captured link could be redeemed again while the user completes the
//! challenge.

use crate::{
    Error, IdentityStore, SessionAuthority, UserId,
    callback::decode_code,
    config::TOKEN_PURPOSE,
    redirect::validate_return_url,
};
use std::sync::Arc;

/// Parameters of a redemption attempt, as received from the link.
#[derive(Debug, Clone)]
pub struct RedeemRequest {
    pub user_id: String,
    pub code: String,
    pub return_url: Option<String>,
    /// Whether the caller already holds a session. A signed-in caller is
    /// redirected without any token work.
    pub authenticated: bool,
}

impl RedeemRequest {
    pub fn new(user_id: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            code: code.into(),
            return_url: None,
            authenticated: false,
        }
    }

    pub fn with_return_url(mut self, return_url: impl Into<String>) -> Self {
        self.return_url = Some(return_url.into());
        self
    }

    pub fn authenticated(mut self, authenticated: bool) -> Self {
        self.authenticated = authenticated;
        self
    }
}

/// Why a redemption was rejected. `Display` renders the user-facing message;
/// the server-side log carries the real distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Unknown user, empty parameters, or malformed code. One message for
    /// all three.
    InvalidLink,
    /// Token failed verification: expired, already used, wrong purpose, or
    /// stale security stamp.
    TokenExpired,
    EmailNotConfirmed,
    LockedOut,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::InvalidLink => write!(f, "Invalid sign-in link."),
            RejectReason::TokenExpired => write!(
                f,
                "This sign-in link is invalid or has expired. Please request a new one."
            ),
            RejectReason::EmailNotConfirmed => {
                write!(f, "Please confirm your email before signing in.")
            }
            RejectReason::LockedOut => {
                write!(f, "Your account is locked out. Please try again later.")
            }
        }
    }
}

/// Terminal states of a redemption attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redemption {
    /// Full session established; send the user to `redirect_to`.
    SignedIn { redirect_to: String },

    /// Token verified and invalidated; the second-factor challenge takes
    /// over with `return_url` carried forward.
    TwoFactorRequired { return_url: String },

    /// Caller was already signed in; no token work performed.
    AlreadySignedIn { redirect_to: String },

    Rejected(RejectReason),
}

/// Service that verifies links and completes sign-in.
pub struct MagicLinkRedeemer<S: IdentityStore, A: SessionAuthority> {
    store: Arc<S>,
    sessions: Arc<A>,
}

impl<S: IdentityStore, A: SessionAuthority> MagicLinkRedeemer<S, A> {
    pub fn new(store: Arc<S>, sessions: Arc<A>) -> Self {
        Self { store, sessions }
    }

    pub async fn redeem(&self, request: RedeemRequest) -> Result<Redemption, Error> {
        let return_url = validate_return_url(request.return_url.as_deref()).to_string();

        if request.authenticated {
            return Ok(Redemption::AlreadySignedIn {
                redirect_to: return_url,
            });
        }

        if request.user_id.is_empty() || request.code.is_empty() {
            return Ok(Redemption::Rejected(RejectReason::InvalidLink));
        }

        let user_id = UserId::new(&request.user_id);
        let user = match self.store.find_by_id(&user_id).await? {
            Some(user) => user,
            None => {
                tracing::warn!(user_id = %user_id, "Magic link login attempted with invalid user ID");
                return Ok(Redemption::Rejected(RejectReason::InvalidLink));
            }
        };

        let token = match decode_code(&request.code) {
            Some(token) => token,
            None => {
                tracing::warn!(user_id = %user_id, "Magic link login attempted with invalid code format");
                return Ok(Redemption::Rejected(RejectReason::InvalidLink));
            }
        };

        let valid = self
            .store
            .verify_token(&user_id, TOKEN_PURPOSE, &token)
            .await?;
        if !valid {
            tracing::warn!(user_id = %user_id, "Magic link login failed, invalid or expired token");
            return Ok(Redemption::Rejected(RejectReason::TokenExpired));
        }

        if !user.is_email_verified() {
            tracing::warn!(user_id = %user_id, "Magic link login attempted for unconfirmed email");
            return Ok(Redemption::Rejected(RejectReason::EmailNotConfirmed));
        }

        if user.is_locked_out() {
            tracing::warn!(user_id = %user_id, "Magic link login attempted for locked out user");
            return Ok(Redemption::Rejected(RejectReason::LockedOut));
        }

        if user.two_factor_enabled {
            // Invalidate the token before handing off so a captured link
            // cannot be replayed while the second factor is pending.
            self.store.rotate_security_stamp(&user_id).await?;
            self.sessions.begin_two_factor(&user).await?;
            tracing::info!(user_id = %user_id, "Magic link verified, handing off to two-factor");
            return Ok(Redemption::TwoFactorRequired { return_url });
        }

        self.sessions.sign_in(&user, false).await?;
        self.store.rotate_security_stamp(&user_id).await?;
        tracing::info!(user_id = %user_id, "User logged in via magic link");

        Ok(Redemption::SignedIn {
            redirect_to: return_url,
        })
    }
}
