use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{Error, Result, env_subst::substitute_env, schema::WxMediaConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "wxmedia.toml",
    "wxmedia.yaml",
    "wxmedia.yml",
    "wxmedia.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<WxMediaConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.display().to_string(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations, then apply env overrides.
///
/// Search order:
/// 1. `./wxmedia.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/wxmedia/wxmedia.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to `WxMediaConfig::default()` if nothing is found or the file
/// does not parse.
pub fn discover_and_load() -> WxMediaConfig {
    let config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                WxMediaConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            WxMediaConfig::default()
        },
    };
    apply_env_overrides(config)
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .or_else(|| {
            let dir = config_dir()?;
            CONFIG_FILENAMES
                .iter()
                .map(|name| dir.join(name))
                .find(|p| p.exists())
        })
}

/// Returns the user-global config directory (`~/.config/wxmedia/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "wxmedia").map(|d| d.config_dir().to_path_buf())
}

/// Returns the path of an existing config file, or the default TOML path.
pub fn find_or_default_config_path() -> PathBuf {
    find_config_file().unwrap_or_else(|| {
        config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wxmedia.toml")
    })
}

/// Override credentials and the media directory from `WXMEDIA_*` variables.
pub fn apply_env_overrides(config: WxMediaConfig) -> WxMediaConfig {
    apply_overrides_with(config, |name| std::env::var(name).ok())
}

fn apply_overrides_with(
    mut config: WxMediaConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> WxMediaConfig {
    if let Some(app_id) = lookup("WXMEDIA_APP_ID") {
        config.account.app_id = app_id;
    }
    if let Some(secret) = lookup("WXMEDIA_APP_SECRET") {
        config.account.app_secret = Secret::new(secret);
    }
    if let Some(dir) = lookup("WXMEDIA_MEDIA_PATH") {
        config.media.media_path = PathBuf::from(dir);
    }
    config
}

fn parse_config(raw: &str, path: &Path) -> Result<WxMediaConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => Err(Error::message(format!("unsupported config format: .{ext}"))),
    }
}
