//! Config schema types (account, api endpoints, media storage, http).
use std::{collections::HashMap, path::PathBuf};

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Media type names accepted as keys in `[media.extensions]`.
pub const MEDIA_TYPE_NAMES: &[&str] = &["image", "voice", "video", "thumb"];

pub const DEFAULT_TOKEN_URI: &str = "https://api.weixin.qq.com/cgi-bin/token?grant_type=client_credential&appid={app_id}&secret={app_secret}";
pub const DEFAULT_FILE_UPLOAD_URI: &str =
    "https://api.weixin.qq.com/cgi-bin/media/upload?access_token={access_token}&type={type}";
pub const DEFAULT_FILE_DOWNLOAD_URI: &str =
    "https://api.weixin.qq.com/cgi-bin/media/get?access_token={access_token}&media_id={media_id}";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WxMediaConfig {
    pub account: AccountConfig,
    pub api: ApiConfig,
    pub media: MediaConfig,
    pub http: HttpConfig,
}

impl WxMediaConfig {
    /// Render the config as TOML with the app secret masked.
    pub fn to_redacted_toml(&self) -> crate::Result<String> {
        let mut redacted = self.clone();
        if !self.account.app_secret.expose_secret().is_empty() {
            redacted.account.app_secret = Secret::new("[REDACTED]".into());
        }
        Ok(toml::to_string_pretty(&redacted)?)
    }
}

/// Platform application credentials used to obtain access tokens.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Application ID issued by the platform.
    pub app_id: String,

    /// Application secret.
    #[serde(serialize_with = "serialize_secret")]
    pub app_secret: Secret<String>,
}

impl AccountConfig {
    /// Both the app id and the secret are non-empty.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.app_id.is_empty() && !self.app_secret.expose_secret().is_empty()
    }
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &"[REDACTED]")
            .finish()
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_secret: Secret::new(String::new()),
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Endpoint templates for the platform API.
///
/// Placeholders are written as `{name}` and substituted per call with
/// percent-encoded values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Token endpoint; takes `{app_id}` and `{app_secret}`.
    pub token_uri: String,
    /// Upload endpoint; takes `{access_token}` and `{type}`.
    pub file_upload_uri: String,
    /// Download endpoint; takes `{access_token}` and `{media_id}`.
    pub file_download_uri: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            token_uri: DEFAULT_TOKEN_URI.into(),
            file_upload_uri: DEFAULT_FILE_UPLOAD_URI.into(),
            file_download_uri: DEFAULT_FILE_DOWNLOAD_URI.into(),
        }
    }
}

/// Local storage for downloaded media.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Directory downloaded media is cached in.
    pub media_path: PathBuf,
    /// Per-type file extension overrides, keyed by media type name.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub extensions: HashMap<String, String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            media_path: PathBuf::from("media"),
            extensions: HashMap::new(),
        }
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds. Unset leaves the transport default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Overrides the `User-Agent` header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}
