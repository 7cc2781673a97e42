//! Bearer token lookup.
//!
//! Token issuance and refresh belong to the identity provider. This module
//! only asks it for the current token and never lets a lookup failure abort a
//! request.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::request::bearer_value;

/// Failure reported by an identity provider while looking up a token.
#[derive(Debug, thiserror::Error)]
#[error("token lookup failed: {0}")]
pub struct TokenError(pub String);

/// Source of the current bearer token, implemented by the identity subsystem.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns the currently valid token, or `None` for a signed-out session.
    async fn token(&self) -> Result<Option<String>, TokenError>;
}

/// Provider for clients that never authenticate.
#[derive(Clone, Copy, Debug, Default)]
pub struct Anonymous;

#[async_trait]
impl TokenProvider for Anonymous {
    async fn token(&self) -> Result<Option<String>, TokenError> {
        Ok(None)
    }
}

/// Provider that always returns the same token.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Wraps a raw token. A leading `Bearer ` prefix is stripped.
    pub fn new(token: impl AsRef<str>) -> Self {
        let trimmed = token.as_ref().trim();
        let raw = match trimmed.get(..7) {
            Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => trimmed[7..].trim(),
            _ => trimmed,
        };
        Self(raw.to_owned())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StaticToken").field(&"<redacted>").finish()
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<Option<String>, TokenError> {
        Ok((!self.0.is_empty()).then(|| self.0.clone()))
    }
}

/// Adapter the orchestrator calls on every attempt.
#[derive(Clone)]
pub(crate) struct TokenSource {
    provider: Arc<dyn TokenProvider>,
}

impl TokenSource {
    pub(crate) fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self { provider }
    }

    /// Never fails: provider errors, blank tokens and tokens that cannot be
    /// sent in a header become `None`.
    pub(crate) async fn get_token(&self) -> Option<String> {
        match self.provider.token().await {
            Ok(token) => token.filter(|t| !t.trim().is_empty() && bearer_value(t).is_some()),
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_err, "failed to get bearer token, continuing without one");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::{Anonymous, StaticToken, TokenError, TokenProvider, TokenSource};

    struct Expired;

    #[async_trait]
    impl TokenProvider for Expired {
        async fn token(&self) -> Result<Option<String>, TokenError> {
            Err(TokenError("session expired".to_owned()))
        }
    }

    #[tokio::test]
    async fn provider_failure_becomes_no_token() {
        let source = TokenSource::new(Arc::new(Expired));
        assert_eq!(source.get_token().await, None);
    }

    #[tokio::test]
    async fn static_token_strips_bearer_prefix() {
        let source = TokenSource::new(Arc::new(StaticToken::new("bEaReR abc123")));
        assert_eq!(source.get_token().await.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn anonymous_and_blank_tokens_yield_none() {
        assert_eq!(TokenSource::new(Arc::new(Anonymous)).get_token().await, None);
        assert_eq!(
            TokenSource::new(Arc::new(StaticToken::new("  "))).get_token().await,
            None
        );
    }

    #[test]
    fn debug_redacts_static_token() {
        let debug = format!("{:?}", StaticToken::new("secret-token"));
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }
}
