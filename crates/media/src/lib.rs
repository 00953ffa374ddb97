//! Media upload/download client for the messaging platform API.
//!
//! Uploads send a multipart `media` part and return the platform's media id.
//! Downloads are cached on disk as `<media_path>/<media_id><extension>`.

pub mod client;
pub mod error;
pub mod media_type;
pub mod settings;

pub use {
    client::{DownloadOrigin, DownloadedMedia, MediaClient, http_client},
    error::{Context, Error, Result},
    media_type::MediaType,
    settings::MediaSettings,
};
