//! Default configuration template written by `wxmedia config init`.

use crate::schema::{DEFAULT_FILE_DOWNLOAD_URI, DEFAULT_FILE_UPLOAD_URI, DEFAULT_TOKEN_URI};

/// Generate the documented default config file.
pub fn default_config_template() -> String {
    format!(
        r##"# wxmedia configuration
#
# Environment variable substitution is supported: ${{ENV_VAR}}
# Example: app_secret = "${{WXMEDIA_APP_SECRET}}"

# ──────────────────────────────────────────────────────────────────────────────
# ACCOUNT
# ──────────────────────────────────────────────────────────────────────────────
# Credentials used to request access tokens. Leave empty when passing a
# pre-issued token with --token / WXMEDIA_ACCESS_TOKEN.

[account]
app_id = ""
app_secret = ""

# ──────────────────────────────────────────────────────────────────────────────
# API ENDPOINTS
# ──────────────────────────────────────────────────────────────────────────────
# Placeholders in braces are filled in per request (values are URL-encoded).

[api]
token_uri = "{DEFAULT_TOKEN_URI}"
file_upload_uri = "{DEFAULT_FILE_UPLOAD_URI}"
file_download_uri = "{DEFAULT_FILE_DOWNLOAD_URI}"

# ──────────────────────────────────────────────────────────────────────────────
# MEDIA STORAGE
# ──────────────────────────────────────────────────────────────────────────────
# Downloads are cached as <media_path>/<media_id><extension>. An existing
# file is returned as-is without contacting the API.

[media]
media_path = "media"

# [media.extensions]              # Per-type overrides (image, voice, video, thumb)
# image = ".jpg"
# voice = ".amr"
# video = ".mp4"
# thumb = ".jpg"

# ──────────────────────────────────────────────────────────────────────────────
# HTTP
# ──────────────────────────────────────────────────────────────────────────────

[http]
# timeout_secs = 30               # Whole-request timeout
# user_agent = "wxmedia"          # Custom User-Agent header
"##
    )
}
