//! Email delivery collaborator and the sign-in message itself.
//!
//! Transport is out of scope; anything that can take a recipient, subject,
//! and HTML body can implement [`Mailer`]. Delivery failures are hard errors
//! for issuance, never swallowed.

use crate::Error;
use async_trait::async_trait;

/// An email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Email transport interface.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, email: Email) -> Result<(), Error>;
}

/// Build the sign-in email for a callback link.
///
/// States the fixed expiry and the single-use guarantee so the recipient
/// knows the link's constraints without following it.
pub fn sign_in_email(
    to: &str,
    app_name: &str,
    callback_url: &str,
    expires_in_minutes: i64,
) -> Email {
    let link = escape_attribute(callback_url);
    let html_body = format!(
        "<p>Click the link below to sign in to your account:</p>\
         <p><a href='{link}'>Sign in to {app_name}</a></p>\
         <p>This link expires in {expires_in_minutes} minutes and can only be used once.</p>\
         <p>If you did not request this, please ignore this email.</p>"
    );

    Email {
        to: to.to_string(),
        subject: format!("Sign in to {app_name}"),
        html_body,
    }
}

/// Escape a value for inclusion in an HTML attribute.
fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
