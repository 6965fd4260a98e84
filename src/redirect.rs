//! Open-redirect protection for the post-login destination.
//!
//! The return URL is untrusted caller input on both the issuance and the
//! redemption endpoint, and it round-trips through the emailed link, so it is
//! validated independently on each path rather than trusted from the link.

use crate::config::DEFAULT_RETURN_URL;

/// Validate a caller-supplied return URL, collapsing anything unsafe to
/// [`DEFAULT_RETURN_URL`].
///
/// A URL is accepted only when it is a same-origin relative path: it must
/// start with a single `/` and the second character must not be another `/`
/// (protocol-relative, `//evil.com`) or a backslash (browsers normalize
/// `/\evil.com` to a protocol-relative URL). Everything else, including
/// absolute URLs and empty input, falls back to the default.
///
/// Total function: always returns a usable destination, never fails.
pub fn validate_return_url(candidate: Option<&str>) -> &str {
    match candidate {
        Some(url) if is_local_url(url) => url,
        _ => DEFAULT_RETURN_URL,
    }
}

fn is_local_url(url: &str) -> bool {
    let mut chars = url.chars();
    if chars.next() != Some('/') {
        return false;
    }
    !matches!(chars.next(), Some('/') | Some('\\'))
}
