//! Passwordless magic-link authentication core.
//!
//! This crate implements the protocol half of a magic-link sign-in flow:
//! minting a single-use, time-bounded token bound to a user identity,
//! handing the encoded callback link to an email transport, and later
//! redeeming the link for a session with replay prevention, rate limiting,
//! open-redirect protection, and a clean handoff to an existing two-factor
//! flow.
//!
//! Everything stateful is a collaborator behind a trait: the identity store
//! owns users, tokens, and security stamps ([`IdentityStore`]), session
//! issuance is delegated to a [`SessionAuthority`], email delivery to a
//! [`mailer::Mailer`], and the rate-limit counter to a
//! [`rate_limit::CounterStore`]. The services in [`services`] only
//! orchestrate.
//!
//! # Example
//!
//! ```rust,ignore
//! use linkspell::{MagicLinkConfig, MagicLinkIssuer, MagicLinkRedeemer, RedeemRequest};
//! use linkspell::rate_limit::MemoryCounterStore;
//! use std::sync::Arc;
//!
//! # async fn example(store: Arc<MyStore>, mailer: Arc<MyMailer>, sessions: Arc<MySessions>) {
//! let config = MagicLinkConfig::new("My App", "https://app.example.com");
//! let issuer = MagicLinkIssuer::new(
//!     store.clone(),
//!     Arc::new(MemoryCounterStore::new()),
//!     mailer,
//!     config,
//! );
//! issuer.request("user@example.com", Some("/dashboard")).await.unwrap();
//!
//! // Later, when the user clicks the link:
//! let redeemer = MagicLinkRedeemer::new(store, sessions);
//! let outcome = redeemer
//!     .redeem(RedeemRequest::new("usr_1", "code-from-link").with_return_url("/dashboard"))
//!     .await
//!     .unwrap();
//! # }
//! ```

pub mod callback;
pub mod config;
pub mod error;
pub mod identity;
pub mod mailer;
pub mod rate_limit;
pub mod redirect;
pub mod services;
pub mod user;
pub mod validation;

pub use callback::CallbackReference;
pub use config::{DEFAULT_RETURN_URL, MagicLinkConfig, TOKEN_PURPOSE};
pub use error::Error;
pub use identity::{IdentityStore, SessionAuthority};
pub use services::{
    IssuanceOutcome, MagicLinkIssuer, MagicLinkRedeemer, RedeemRequest, Redemption, RejectReason,
};
pub use user::{User, UserId};
