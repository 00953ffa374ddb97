//! Configuration loading, env substitution, and validation.
//!
//! Config files: `wxmedia.toml`, `wxmedia.yaml`, or `wxmedia.json`
//! Searched in `./` then `~/.config/wxmedia/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod template;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{
        apply_env_overrides, config_dir, discover_and_load, find_config_file,
        find_or_default_config_path, load_config,
    },
    schema::{
        AccountConfig, ApiConfig, DEFAULT_FILE_DOWNLOAD_URI, DEFAULT_FILE_UPLOAD_URI,
        DEFAULT_TOKEN_URI, HttpConfig, MEDIA_TYPE_NAMES, MediaConfig, WxMediaConfig,
    },
    template::default_config_template,
    validate::{Diagnostic, Severity, ValidationResult},
};
