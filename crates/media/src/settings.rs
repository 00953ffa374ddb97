use std::{collections::HashMap, path::PathBuf};

use wxmedia_config::WxMediaConfig;

use crate::{Error, MediaType, Result};

/// Endpoints and storage layout the media client works against.
#[derive(Debug, Clone)]
pub struct MediaSettings {
    /// Upload template; takes `{access_token}` and `{type}`.
    pub upload_uri: String,
    /// Download template; takes `{access_token}` and `{media_id}`.
    pub download_uri: String,
    /// Root directory for cached downloads.
    pub media_path: PathBuf,
    /// Extension overrides; types not listed use [`MediaType::default_extension`].
    pub extensions: HashMap<MediaType, String>,
}

impl MediaSettings {
    #[must_use]
    pub fn new(
        upload_uri: impl Into<String>,
        download_uri: impl Into<String>,
        media_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            upload_uri: upload_uri.into(),
            download_uri: download_uri.into(),
            media_path: media_path.into(),
            extensions: HashMap::new(),
        }
    }

    /// Take endpoints from `[api]` and storage from `[media]`.
    pub fn from_config(config: &WxMediaConfig) -> Result<Self> {
        let mut settings = Self::new(
            config.api.file_upload_uri.clone(),
            config.api.file_download_uri.clone(),
            config.media.media_path.clone(),
        );
        for (name, ext) in &config.media.extensions {
            settings = settings.with_extension(name.parse()?, ext.clone())?;
        }
        Ok(settings)
    }

    /// Override the extension of `media_type`.
    ///
    /// The extension becomes part of a file name under `media_path`, so it
    /// must start with `.` and cannot contain path separators.
    pub fn with_extension(mut self, media_type: MediaType, ext: impl Into<String>) -> Result<Self> {
        let ext = ext.into();
        validate_extension(&ext)?;
        self.extensions.insert(media_type, ext);
        Ok(self)
    }

    /// File extension (including the dot) for `media_type`.
    #[must_use]
    pub fn extension(&self, media_type: MediaType) -> &str {
        self.extensions
            .get(&media_type)
            .map_or(media_type.default_extension(), String::as_str)
    }
}

fn validate_extension(ext: &str) -> Result<()> {
    let bad = !ext.starts_with('.')
        || ext == "."
        || ext.contains("..")
        || ext.contains(['/', '\\', '\0']);
    if bad {
        return Err(Error::invalid_input(format!(
            "extension {ext:?} must start with '.' and cannot contain path separators"
        )));
    }
    Ok(())
}
