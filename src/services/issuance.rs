//! Magic link issuance.
//!
//! Every branch except throttling converges on the same [`IssuanceOutcome::Accepted`]
//! value, whether or not a token was actually minted. A caller probing for
//! account existence sees identical responses for unknown, unconfirmed, and
//! locked-out emails as for real ones.

use crate::{
    Error, IdentityStore, User,
    callback::{CallbackReference, encode_code},
    config::{MagicLinkConfig, TOKEN_PURPOSE},
    mailer::{Mailer, sign_in_email},
    rate_limit::{CounterStore, RateLimitDecision, RateLimiter},
    redirect::validate_return_url,
    validation::validate_email,
};
use chrono::Duration;
use std::sync::Arc;

/// Outcome of an issuance request as observable by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuanceOutcome {
    /// The generic confirmation, regardless of whether an email was sent.
    Accepted { return_url: String },

    /// Over the per-identity quota; the one response shape distinct from
    /// the generic confirmation.
    Throttled { retry_after: Duration },
}

impl IssuanceOutcome {
    /// User-facing message for this outcome.
    pub fn user_message(&self) -> String {
        match self {
            IssuanceOutcome::Accepted { .. } => {
                "Check your email for a sign-in link.".to_string()
            }
            IssuanceOutcome::Throttled { retry_after } => format!(
                "Too many requests. Please try again in {} minutes.",
                retry_after.num_minutes()
            ),
        }
    }
}

/// Service that mints sign-in tokens and hands them to the mailer.
pub struct MagicLinkIssuer<S: IdentityStore, C: CounterStore, M: Mailer> {
    store: Arc<S>,
    limiter: RateLimiter<C>,
    mailer: Arc<M>,
    config: MagicLinkConfig,
}

impl<S: IdentityStore, C: CounterStore, M: Mailer> MagicLinkIssuer<S, C, M> {
    pub fn new(
        store: Arc<S>,
        counter_store: Arc<C>,
        mailer: Arc<M>,
        config: MagicLinkConfig,
    ) -> Self {
        let limiter = RateLimiter::new(
            counter_store,
            config.max_requests_per_window,
            config.rate_limit_window,
        );
        Self {
            store,
            limiter,
            mailer,
            config,
        }
    }

    /// Request a sign-in link for `email`.
    ///
    /// Returns [`IssuanceOutcome::Accepted`] for unknown, unconfirmed, and
    /// locked-out accounts exactly as for the success path; only a malformed
    /// email (validation error), an over-quota identity (throttled), or a
    /// collaborator failure (storage, delivery) break that uniformity.
    pub async fn request(
        &self,
        email: &str,
        return_url: Option<&str>,
    ) -> Result<IssuanceOutcome, Error> {
        let return_url = validate_return_url(return_url).to_string();

        validate_email(email)?;

        // The throttle check precedes the account lookup, so a throttled
        // response reveals only that this address asked recently, not
        // whether it belongs to an account.
        if let RateLimitDecision::Throttled { retry_after } = self.limiter.check(email).await? {
            tracing::warn!(email = %email, "Magic link request throttled");
            return Ok(IssuanceOutcome::Throttled { retry_after });
        }

        let user = match self.store.find_by_email(email).await? {
            Some(user) if user.is_email_verified() => user,
            _ => {
                // Don't reveal that the user does not exist or is not confirmed
                tracing::info!(
                    email = %email,
                    "Magic link requested for non-existent or unconfirmed email"
                );
                return Ok(IssuanceOutcome::Accepted { return_url });
            }
        };

        if user.is_locked_out() {
            tracing::warn!(email = %email, "Magic link requested for locked out user");
            return Ok(IssuanceOutcome::Accepted { return_url });
        }

        // Quota is consumed only for eligible accounts, so probing unknown
        // addresses never shifts a real account toward its limit.
        self.limiter.record(email).await?;

        self.send_link(&user, &return_url).await?;

        tracing::info!(email = %email, "Magic link sent");
        Ok(IssuanceOutcome::Accepted { return_url })
    }

    async fn send_link(&self, user: &User, return_url: &str) -> Result<(), Error> {
        let token = self.store.generate_token(&user.id, TOKEN_PURPOSE).await?;
        let reference = CallbackReference::new(
            user.id.clone(),
            encode_code(&token),
            return_url.to_string(),
        );
        let callback_url = reference.callback_url(
            &self.config.base_url,
            &self.config.callback_path,
            &self.config.area,
        )?;

        let email = sign_in_email(
            &user.email,
            &self.config.app_name,
            callback_url.as_str(),
            self.config.token_lifespan.num_minutes(),
        );
        self.mailer.send(email).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        User, UserId,
        error::DeliveryError,
        mailer::Email,
        rate_limit::MemoryCounterStore,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MockIdentityStore {
        users: HashMap<String, User>,
        tokens_generated: Mutex<u32>,
    }

    impl MockIdentityStore {
        fn new(users: Vec<User>) -> Self {
            Self {
                users: users.into_iter().map(|u| (u.email.clone(), u)).collect(),
                tokens_generated: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl IdentityStore for MockIdentityStore {
        async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
            Ok(self.users.values().find(|u| &u.id == id).cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
            Ok(self.users.get(email).cloned())
        }

        async fn generate_token(&self, _user_id: &UserId, _purpose: &str) -> Result<String, Error> {
            *self.tokens_generated.lock().unwrap() += 1;
            Ok("raw-token".to_string())
        }

        async fn verify_token(
            &self,
            _user_id: &UserId,
            _purpose: &str,
            _token: &str,
        ) -> Result<bool, Error> {
            Ok(true)
        }

        async fn rotate_security_stamp(&self, _user_id: &UserId) -> Result<(), Error> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockMailer {
        sent: Mutex<Vec<Email>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for MockMailer {
        async fn send(&self, email: Email) -> Result<(), Error> {
            if self.fail {
                return Err(DeliveryError::Transport("smtp refused".to_string()).into());
            }
            self.sent.lock().unwrap().push(email);
            Ok(())
        }
    }

    fn confirmed_user(id: &str, email: &str) -> User {
        User::builder()
            .id(UserId::new(id))
            .email(email.to_string())
            .email_verified_at(Some(Utc::now()))
            .build()
            .unwrap()
    }

    fn issuer(
        users: Vec<User>,
    ) -> (
        MagicLinkIssuer<MockIdentityStore, MemoryCounterStore, MockMailer>,
        Arc<MockIdentityStore>,
        Arc<MockMailer>,
    ) {
        let store = Arc::new(MockIdentityStore::new(users));
        let mailer = Arc::new(MockMailer::default());
        let issuer = MagicLinkIssuer::new(
            store.clone(),
            Arc::new(MemoryCounterStore::new()),
            mailer.clone(),
            MagicLinkConfig::default(),
        );
        (issuer, store, mailer)
    }

    #[tokio::test]
    async fn test_confirmed_user_gets_email() {
        let (issuer, store, mailer) = issuer(vec![confirmed_user("usr_1", "a@example.com")]);

        let outcome = issuer.request("a@example.com", Some("/dash")).await.unwrap();
        assert_eq!(
            outcome,
            IssuanceOutcome::Accepted {
                return_url: "/dash".to_string()
            }
        );

        assert_eq!(*store.tokens_generated.lock().unwrap(), 1);
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@example.com");
        assert!(sent[0].html_body.contains("userId=usr_1"));
        assert!(sent[0].html_body.contains("returnUrl=%2Fdash"));
    }

    #[tokio::test]
    async fn test_invalid_email_is_validation_error() {
        let (issuer, store, _) = issuer(vec![]);
        let result = issuer.request("not-an-email", None).await;
        assert!(result.unwrap_err().is_validation_error());
        assert_eq!(*store.tokens_generated.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_and_unconfirmed_are_indistinguishable() {
        let mut unconfirmed = confirmed_user("usr_2", "b@example.com");
        unconfirmed.email_verified_at = None;
        let (issuer, store, mailer) = issuer(vec![unconfirmed]);

        let unknown = issuer.request("nobody@example.com", Some("/r")).await.unwrap();
        let not_confirmed = issuer.request("b@example.com", Some("/r")).await.unwrap();
        assert_eq!(unknown, not_confirmed);

        assert_eq!(*store.tokens_generated.lock().unwrap(), 0);
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_locked_out_user_gets_generic_outcome_without_email() {
        let mut user = confirmed_user("usr_3", "c@example.com");
        user.locked_out_until = Some(Utc::now() + Duration::minutes(30));
        let (issuer, _, mailer) = issuer(vec![user]);

        let outcome = issuer.request("c@example.com", None).await.unwrap();
        assert_eq!(
            outcome,
            IssuanceOutcome::Accepted {
                return_url: "/".to_string()
            }
        );
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quota_not_consumed_for_unknown_email() {
        let (issuer, _, _) = issuer(vec![confirmed_user("usr_1", "a@example.com")]);

        // Unknown emails never count toward the quota
        for _ in 0..5 {
            let outcome = issuer.request("nobody@example.com", None).await.unwrap();
            assert!(matches!(outcome, IssuanceOutcome::Accepted { .. }));
        }
    }

    #[tokio::test]
    async fn test_throttled_after_max_requests() {
        let (issuer, _, mailer) = issuer(vec![confirmed_user("usr_1", "a@example.com")]);

        for _ in 0..3 {
            let outcome = issuer.request("a@example.com", None).await.unwrap();
            assert!(matches!(outcome, IssuanceOutcome::Accepted { .. }));
        }

        let outcome = issuer.request("a@example.com", None).await.unwrap();
        assert_eq!(
            outcome,
            IssuanceOutcome::Throttled {
                retry_after: Duration::minutes(15)
            }
        );
        assert_eq!(
            outcome.user_message(),
            "Too many requests. Please try again in 15 minutes."
        );
        assert_eq!(mailer.sent.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_malicious_return_url_replaced() {
        let (issuer, _, mailer) = issuer(vec![confirmed_user("usr_1", "a@example.com")]);

        let outcome = issuer
            .request("a@example.com", Some("https://evil.com/phish"))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            IssuanceOutcome::Accepted {
                return_url: "/".to_string()
            }
        );
        let sent = mailer.sent.lock().unwrap();
        assert!(sent[0].html_body.contains("returnUrl=%2F"));
        assert!(!sent[0].html_body.contains("evil.com"));
    }

    #[tokio::test]
    async fn test_delivery_failure_propagates() {
        let store = Arc::new(MockIdentityStore::new(vec![confirmed_user(
            "usr_1",
            "a@example.com",
        )]));
        let mailer = Arc::new(MockMailer {
            sent: Mutex::new(Vec::new()),
            fail: true,
        });
        let issuer = MagicLinkIssuer::new(
            store,
            Arc::new(MemoryCounterStore::new()),
            mailer,
            MagicLinkConfig::default(),
        );

        let result = issuer.request("a@example.com", None).await;
        assert!(result.unwrap_err().is_delivery_error());
    }
}
