use {
    serde::{Deserialize, Serialize},
    std::{fmt, str::FromStr},
};

use crate::Error;

/// Category of an uploaded or downloaded media asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Voice,
    Video,
    #[serde(alias = "thumbnail")]
    Thumb,
}

impl MediaType {
    /// Name sent as the upload `type` parameter.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Voice => "voice",
            Self::Video => "video",
            Self::Thumb => "thumb",
        }
    }

    /// Extension (with leading dot) used for cached downloads.
    #[must_use]
    pub fn default_extension(&self) -> &'static str {
        match self {
            Self::Image | Self::Thumb => ".jpg",
            Self::Voice => ".amr",
            Self::Video => ".mp4",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "voice" => Ok(Self::Voice),
            "video" => Ok(Self::Video),
            "thumb" | "thumbnail" => Ok(Self::Thumb),
            other => Err(Error::invalid_input(format!(
                "unknown media type `{other}` (expected image, voice, video, or thumb)"
            ))),
        }
    }
}
