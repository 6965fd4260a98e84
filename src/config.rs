//! Configuration for the magic link flow.
//!
//! Defaults mirror the values the rest of the crate is documented against:
//! a 15 minute token lifespan, 3 issuance requests per 15 minute window, and
//! `/` as the fallback redirect.

use chrono::Duration;

/// Purpose tag distinguishing sign-in tokens from other token classes minted
/// against the same account (email confirmation, password reset, ...). A
/// token generated under one purpose never verifies under another.
pub const TOKEN_PURPOSE: &str = "MagicLinkLogin";

/// Fallback destination used whenever a caller-supplied return URL fails
/// validation.
pub const DEFAULT_RETURN_URL: &str = "/";

/// Configuration for magic link issuance and delivery.
#[derive(Debug, Clone)]
pub struct MagicLinkConfig {
    /// Application name, used in the subject and body of sign-in emails.
    pub app_name: String,

    /// Absolute base URL of the application, used to build callback links.
    pub base_url: String,

    /// Path of the redemption endpoint, joined onto `base_url`.
    pub callback_path: String,

    /// Routing area carried in the callback URL query string.
    pub area: String,

    /// How long an issued token stays valid.
    pub token_lifespan: Duration,

    /// Maximum issuance requests per identity within one rate-limit window.
    pub max_requests_per_window: u32,

    /// Length of the rate-limit window.
    pub rate_limit_window: Duration,
}

impl Default for MagicLinkConfig {
    fn default() -> Self {
        Self {
            app_name: "Linkspell".to_string(),
            base_url: "http://localhost:8080".to_string(),
            callback_path: "/account/login-with-magic-link".to_string(),
            area: "Identity".to_string(),
            token_lifespan: Duration::minutes(15),
            max_requests_per_window: 3,
            rate_limit_window: Duration::minutes(15),
        }
    }
}

impl MagicLinkConfig {
    pub fn new(app_name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_callback_path(mut self, path: impl Into<String>) -> Self {
        self.callback_path = path.into();
        self
    }

    pub fn with_token_lifespan(mut self, lifespan: Duration) -> Self {
        self.token_lifespan = lifespan;
        self
    }

    pub fn with_rate_limit(mut self, max_requests: u32, window: Duration) -> Self {
        self.max_requests_per_window = max_requests;
        self.rate_limit_window = window;
        self
    }
}
