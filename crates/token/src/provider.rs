use {async_trait::async_trait, secrecy::Secret};

use crate::Result;

/// Source of the access token attached to every API call.
///
/// Implementations own expiry and refresh; callers ask for a token per
/// request and never keep it.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a currently valid access token.
    async fn access_token(&self) -> Result<Secret<String>>;

    /// Drop any cached token so the next call fetches a fresh one.
    async fn invalidate(&self) {}
}

/// Always hands out the same token.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: Secret<String>,
}

impl StaticTokenProvider {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Secret::new(token.into()),
        }
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<Secret<String>> {
        Ok(self.token.clone())
    }
}
