//! The externally transmitted callback reference and its opaque code codec.
//!
//! The token minted by the identity store is carried inside the emailed link
//! as a URL-safe opaque code. The code must round-trip back to the exact
//! token verified server-side; any decode failure is collapsed to `None` so
//! the redemption path can treat a malformed code exactly like an unknown
//! user, leaking nothing about which check failed.

use crate::{Error, UserId, error::ValidationError};
use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use url::Url;

/// Encode a raw token into the URL-safe opaque code carried in the link.
pub fn encode_code(token: &str) -> String {
    BASE64_URL_SAFE_NO_PAD.encode(token.as_bytes())
}

/// Decode an opaque code back into the raw token. Malformed encoding and
/// invalid UTF-8 both yield `None`, indistinguishable from each other.
pub fn decode_code(code: &str) -> Option<String> {
    let bytes = BASE64_URL_SAFE_NO_PAD.decode(code).ok()?;
    String::from_utf8(bytes).ok()
}

/// The pieces of state a sign-in link must round-trip: who the link is for,
/// the opaque code, and where to send the user afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackReference {
    pub user_id: UserId,
    pub code: String,
    pub return_url: String,
}

impl CallbackReference {
    pub fn new(user_id: UserId, code: String, return_url: String) -> Self {
        Self {
            user_id,
            code,
            return_url,
        }
    }

    /// Build the absolute callback URL with query parameters
    /// `{area, userId, code, returnUrl}`.
    pub fn callback_url(&self, base_url: &str, path: &str, area: &str) -> Result<Url, Error> {
        let base = Url::parse(base_url).map_err(|e| {
            ValidationError::InvalidField(format!("Invalid base URL {base_url}: {e}"))
        })?;
        let mut url = base.join(path).map_err(|e| {
            ValidationError::InvalidField(format!("Invalid callback path {path}: {e}"))
        })?;

        url.query_pairs_mut()
            .append_pair("area", area)
            .append_pair("userId", self.user_id.as_str())
            .append_pair("code", &self.code)
            .append_pair("returnUrl", &self.return_url);

        Ok(url)
    }
}
