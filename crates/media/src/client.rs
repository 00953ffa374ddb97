//! Upload and download of media through the platform's HTTP API.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use {
    bytes::Bytes,
    reqwest::{
        Client, Response,
        header::CONTENT_TYPE,
        multipart::{Form, Part},
    },
    secrecy::ExposeSecret,
    serde::Deserialize,
    tokio::io::AsyncWriteExt,
    tracing::{debug, info, warn},
    wxmedia_config::{HttpConfig, WxMediaConfig},
    wxmedia_token::TokenProvider,
};

use crate::{Context, Error, MediaSettings, MediaType, Result};

/// Multipart field the platform expects the file under.
const MEDIA_PART: &str = "media";

/// Error codes meaning the access token itself was rejected.
const TOKEN_REJECTED_CODES: &[i64] = &[40001, 40014, 42001];

/// Where a downloaded file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOrigin {
    /// The file already existed and was returned untouched.
    Cached,
    /// The file was fetched from the API and written by this call.
    Fetched,
}

/// A media file persisted under the media directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedMedia {
    pub path: PathBuf,
    pub origin: DownloadOrigin,
}

impl DownloadedMedia {
    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.origin == DownloadOrigin::Cached
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    media_id: Option<String>,
    // Thumbnail uploads answer with this instead of `media_id`.
    #[serde(default)]
    thumb_media_id: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    created_at: Option<i64>,
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

impl UploadResponse {
    fn media_id(&self) -> Option<&str> {
        [&self.media_id, &self.thumb_media_id]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|id| !id.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

/// Build the HTTP transport from the `[http]` section.
pub fn http_client(config: &HttpConfig) -> Result<Client> {
    let user_agent = config
        .user_agent
        .clone()
        .unwrap_or_else(|| format!("wxmedia/{}", env!("CARGO_PKG_VERSION")));
    let mut builder = Client::builder().user_agent(user_agent);
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

/// Client for the platform's media endpoints.
///
/// Holds no per-call state; clones share the HTTP connection pool and the
/// token provider.
#[derive(Clone)]
pub struct MediaClient {
    http: Client,
    tokens: Arc<dyn TokenProvider>,
    settings: Arc<MediaSettings>,
}

impl std::fmt::Debug for MediaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaClient")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl MediaClient {
    #[must_use]
    pub fn new(http: Client, tokens: Arc<dyn TokenProvider>, settings: MediaSettings) -> Self {
        Self {
            http,
            tokens,
            settings: Arc::new(settings),
        }
    }

    /// Build a client from the loaded config over an existing transport.
    pub fn from_config(
        http: Client,
        config: &WxMediaConfig,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self> {
        Ok(Self::new(http, tokens, MediaSettings::from_config(config)?))
    }

    #[must_use]
    pub fn settings(&self) -> &MediaSettings {
        &self.settings
    }

    /// Local path a download of `media_id` is cached at:
    /// `<media_path>/<media_id><extension>`.
    pub fn media_path(&self, media_id: &str, media_type: MediaType) -> Result<PathBuf> {
        validate_media_id(media_id)?;
        let file_name = format!("{media_id}{}", self.settings.extension(media_type));
        Ok(self.settings.media_path.join(file_name))
    }

    /// Upload the file at `path`, returning the platform's media id.
    ///
    /// The multipart file name is the final component of `path`.
    pub async fn upload_file(&self, path: impl AsRef<Path>, media_type: MediaType) -> Result<String> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("upload path {} has no usable file name", path.display()))?
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| Error::io(format!("failed to read {}", path.display()), source))?;
        self.upload_bytes(&file_name, bytes, media_type).await
    }

    /// Upload in-memory content under `file_name`, returning the media id.
    pub async fn upload_bytes(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        media_type: MediaType,
    ) -> Result<String> {
        let token = self.tokens.access_token().await?;
        let url = wxmedia_common::expand(&self.settings.upload_uri, &[
            ("access_token", token.expose_secret().as_str()),
            ("type", media_type.as_str()),
        ])?;

        let size = bytes.len();
        debug!(file_name, %media_type, bytes = size, "uploading media");
        let form = Form::new().part(MEDIA_PART, Part::bytes(bytes).file_name(file_name.to_string()));
        let resp = self.http.post(url).multipart(form).send().await?;
        let body = self.success_body(resp).await?;

        let parsed: UploadResponse = serde_json::from_slice(&body).map_err(|e| {
            Error::invalid_response(format!("upload response is not valid JSON: {e}"))
        })?;
        if parsed.errcode != 0 {
            return Err(self.api_error(parsed.errcode, parsed.errmsg).await);
        }
        let media_id = parsed
            .media_id()
            .map(str::to_owned)
            .ok_or_else(|| Error::invalid_response("upload response has no media_id"))?;

        info!(
            %media_type,
            media_id = %media_id,
            bytes = size,
            kind = parsed.kind.as_deref().unwrap_or(""),
            created_at = parsed.created_at.unwrap_or_default(),
            "media uploaded"
        );
        Ok(media_id)
    }

    /// Fetch the raw content of `media_id`.
    pub async fn download_data(&self, media_id: &str, media_type: MediaType) -> Result<Bytes> {
        let token = self.tokens.access_token().await?;
        let url = wxmedia_common::expand(&self.settings.download_uri, &[
            ("access_token", token.expose_secret().as_str()),
            ("media_id", media_id),
        ])?;

        debug!(media_id, %media_type, "downloading media");
        let resp = self.http.get(url).send().await?;
        let is_textual = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json") || ct.starts_with("text/plain"));
        let body = self.success_body(resp).await?;

        // Failures come back as a JSON error object with a 200 status.
        if is_textual
            && let Ok(payload) = serde_json::from_slice::<ErrorPayload>(&body)
            && payload.errcode != 0
        {
            return Err(self.api_error(payload.errcode, payload.errmsg).await);
        }

        debug!(media_id, bytes = body.len(), "media downloaded");
        Ok(body)
    }

    /// Download `media_id` into the media directory.
    ///
    /// An existing file at the target path is returned as-is without calling
    /// the API. Otherwise the content is fetched, written to a temporary
    /// sibling, and renamed into place.
    pub async fn download(&self, media_id: &str, media_type: MediaType) -> Result<DownloadedMedia> {
        let path = self.media_path(media_id, media_type)?;

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {
                debug!(media_id, path = %path.display(), "media already cached");
                return Ok(DownloadedMedia {
                    path,
                    origin: DownloadOrigin::Cached,
                });
            },
            Ok(_) => {
                return Err(Error::invalid_input(format!(
                    "{} exists and is not a regular file",
                    path.display()
                )));
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(source) => {
                return Err(Error::io(format!("failed to inspect {}", path.display()), source));
            },
        }

        let data = self.download_data(media_id, media_type).await?;
        write_file(&path, &data).await?;

        info!(media_id, %media_type, path = %path.display(), bytes = data.len(), "media saved");
        Ok(DownloadedMedia {
            path,
            origin: DownloadOrigin::Fetched,
        })
    }

    async fn success_body(&self, resp: Response) -> Result<Bytes> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status { status, body });
        }
        Ok(resp.bytes().await?)
    }

    async fn api_error(&self, errcode: i64, errmsg: String) -> Error {
        if TOKEN_REJECTED_CODES.contains(&errcode) {
            warn!(errcode, "access token rejected, invalidating");
            self.tokens.invalidate().await;
        }
        Error::Api { errcode, errmsg }
    }
}

fn validate_media_id(media_id: &str) -> Result<()> {
    let bad = media_id.is_empty()
        || media_id == "."
        || media_id == ".."
        || media_id.contains(['/', '\\', '\0']);
    if bad {
        return Err(Error::invalid_input(format!(
            "media id {media_id:?} cannot be used as a file name"
        )));
    }
    Ok(())
}

/// Write `data` to `path` through a uniquely named temporary file.
///
/// Missing parent directories are created on demand.
async fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("download path has no file name")?;
    let tmp = path.with_file_name(format!(".{file_name}.{}.part", uuid::Uuid::new_v4()));

    let mut file = match tokio::fs::File::create(&tmp).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let Some(parent) = tmp.parent() else {
                return Err(Error::io(format!("failed to create {}", tmp.display()), e));
            };
            warn!(dir = %parent.display(), "media directory missing, creating it");
            tokio::fs::create_dir_all(parent).await.map_err(|source| {
                Error::io(format!("failed to create directory {}", parent.display()), source)
            })?;
            tokio::fs::File::create(&tmp).await.map_err(|source| {
                Error::io(format!("failed to create {}", tmp.display()), source)
            })?
        },
        Err(source) => {
            return Err(Error::io(format!("failed to create {}", tmp.display()), source));
        },
    };

    let written = async {
        file.write_all(data).await?;
        file.flush().await?;
        file.sync_all().await
    }
    .await;
    drop(file);

    let result = match written {
        Ok(()) => tokio::fs::rename(&tmp, path)
            .await
            .map_err(|source| Error::io(format!("failed to move media into {}", path.display()), source)),
        Err(source) => Err(Error::io(format!("failed to write {}", tmp.display()), source)),
    };
    if result.is_err()
        && let Err(e) = tokio::fs::remove_file(&tmp).await
    {
        warn!(path = %tmp.display(), error = %e, "failed to remove partial download");
    }
    result
}
