//! Service layer for the magic link flow.
//!
//! [`MagicLinkIssuer`] mints and delivers sign-in links;
//! [`MagicLinkRedeemer`] turns a clicked link into a session.

pub mod issuance;
pub mod redemption;

pub use issuance::{IssuanceOutcome, MagicLinkIssuer};
pub use redemption::{MagicLinkRedeemer, RedeemRequest, Redemption, RejectReason};
