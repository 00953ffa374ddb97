use std::time::{Duration, Instant};

use {
    async_trait::async_trait,
    reqwest::Client,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tokio::sync::Mutex,
    tracing::{debug, info},
    wxmedia_config::WxMediaConfig,
};

use crate::{Error, Result, TokenProvider};

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_TTL_SECS: u64 = 7200;

/// Tokens are refreshed this long before they actually expire.
const REFRESH_SKEW: Duration = Duration::from_secs(60);

#[derive(Clone)]
struct CachedAccessToken {
    token: Secret<String>,
    expires_at: Instant,
}

impl CachedAccessToken {
    fn is_valid(&self) -> bool {
        self.expires_at > Instant::now() + REFRESH_SKEW
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

/// Obtains tokens with the app id/secret client-credential grant and caches
/// them until shortly before expiry.
pub struct ClientCredentialTokenProvider {
    http: Client,
    token_uri: String,
    app_id: String,
    app_secret: Secret<String>,
    cache: Mutex<Option<CachedAccessToken>>,
}

impl std::fmt::Debug for ClientCredentialTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentialTokenProvider")
            .field("token_uri", &self.token_uri)
            .field("app_id", &self.app_id)
            .field("app_secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl ClientCredentialTokenProvider {
    #[must_use]
    pub fn new(
        http: Client,
        token_uri: impl Into<String>,
        app_id: impl Into<String>,
        app_secret: Secret<String>,
    ) -> Self {
        Self {
            http,
            token_uri: token_uri.into(),
            app_id: app_id.into(),
            app_secret,
            cache: Mutex::new(None),
        }
    }

    /// Build from the `[account]` and `[api]` sections.
    pub fn from_config(http: Client, config: &WxMediaConfig) -> Result<Self> {
        if !config.account.has_credentials() {
            return Err(Error::message(
                "account.app_id and account.app_secret are required to request access tokens",
            ));
        }
        Ok(Self::new(
            http,
            config.api.token_uri.clone(),
            config.account.app_id.clone(),
            config.account.app_secret.clone(),
        ))
    }

    async fn fetch(&self) -> Result<CachedAccessToken> {
        let url = wxmedia_common::expand(&self.token_uri, &[
            ("app_id", self.app_id.as_str()),
            ("app_secret", self.app_secret.expose_secret().as_str()),
        ])?;

        debug!(app_id = %self.app_id, "requesting access token");
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status { status, body });
        }

        let body: TokenResponse = resp.json().await?;
        if body.errcode != 0 {
            return Err(Error::Api {
                errcode: body.errcode,
                errmsg: body.errmsg,
            });
        }
        let Some(token) = body.access_token.filter(|t| !t.is_empty()) else {
            return Err(Error::message("token response did not contain access_token"));
        };

        let ttl = body.expires_in.unwrap_or(DEFAULT_TTL_SECS);
        info!(app_id = %self.app_id, expires_in = ttl, "access token refreshed");
        Ok(CachedAccessToken {
            token: Secret::new(token),
            expires_at: Instant::now() + Duration::from_secs(ttl),
        })
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialTokenProvider {
    async fn access_token(&self) -> Result<Secret<String>> {
        // Held across the fetch so concurrent callers share one refresh.
        let mut guard = self.cache.lock().await;
        if let Some(cached) = guard.as_ref()
            && cached.is_valid()
        {
            return Ok(cached.token.clone());
        }

        let fresh = self.fetch().await?;
        let token = fresh.token.clone();
        *guard = Some(fresh);
        Ok(token)
    }

    async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }
}
