//! Configuration validation.
//!
//! Checks syntax, unknown fields, field types, and the semantic rules the
//! media client relies on (template placeholders, extension overrides).

use std::path::{Path, PathBuf};

use crate::schema::{MEDIA_TYPE_NAMES, WxMediaConfig};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "template",
    /// "media", "credentials", "http", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "api.file_upload_uri"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Known keys per section.
const SCHEMA: &[(&str, &[&str])] = &[
    ("account", &["app_id", "app_secret"]),
    ("api", &["token_uri", "file_upload_uri", "file_download_uri"]),
    ("media", &["media_path", "extensions"]),
    ("http", &["timeout_secs", "user_agent"]),
];

/// Placeholders each endpoint template must contain.
const TEMPLATE_PLACEHOLDERS: &[(&str, &[&str])] = &[
    ("api.token_uri", &["{app_id}", "{app_secret}"]),
    ("api.file_upload_uri", &["{access_token}", "{type}"]),
    ("api.file_download_uri", &["{access_token}", "{media_id}"]),
];

/// Validate a config file at the given path, or discover the default config
/// file location if `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => crate::loader::find_config_file(),
    };

    let Some(actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Info,
                "file-ref",
                "",
                "no config file found; using defaults",
            )],
            config_path: None,
        };
    };

    let mut result = match std::fs::read_to_string(&actual_path) {
        Ok(content) => {
            let content = crate::env_subst::substitute_env(&content);
            match actual_path.extension().and_then(|e| e.to_str()) {
                Some("yaml" | "yml") => validate_value(
                    serde_yaml::from_str::<serde_json::Value>(&content)
                        .map_err(|e| format!("YAML syntax error: {e}")),
                ),
                Some("json") => validate_value(
                    serde_json::from_str::<serde_json::Value>(&content)
                        .map_err(|e| format!("JSON syntax error: {e}")),
                ),
                _ => validate_toml_str(&content),
            }
        },
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("failed to read config file: {e}"),
            )],
            config_path: None,
        },
    };
    result.config_path = Some(actual_path);
    result
}

/// Validate a TOML string without touching the filesystem.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let parsed = toml::from_str::<toml::Value>(toml_str)
        .map_err(|e| format!("TOML syntax error: {e}"))
        .and_then(|v| serde_json::to_value(v).map_err(|e| format!("TOML syntax error: {e}")));
    validate_value(parsed)
}

fn validate_value(parsed: Result<serde_json::Value, String>) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let value = match parsed {
        Ok(v) => v,
        Err(message) => {
            diagnostics.push(Diagnostic::new(Severity::Error, "syntax", "", message));
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    check_unknown_fields(&value, &mut diagnostics);

    match serde_json::from_value::<WxMediaConfig>(value) {
        Ok(config) => check_semantics(&config, &mut diagnostics),
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "",
            format!("type error: {e}"),
        )),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn check_unknown_fields(value: &serde_json::Value, diagnostics: &mut Vec<Diagnostic>) {
    let Some(root) = value.as_object() else {
        return;
    };
    for (section, body) in root {
        let Some((_, fields)) = SCHEMA.iter().find(|(name, _)| name == section) else {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "unknown-field",
                section.as_str(),
                format!("unknown section `{section}`"),
            ));
            continue;
        };
        let Some(table) = body.as_object() else {
            continue;
        };
        for key in table.keys() {
            if !fields.contains(&key.as_str()) {
                diagnostics.push(Diagnostic::new(
                    Severity::Warning,
                    "unknown-field",
                    format!("{section}.{key}"),
                    format!("unknown field `{key}` in [{section}]"),
                ));
            }
        }
    }
}

fn check_semantics(config: &WxMediaConfig, diagnostics: &mut Vec<Diagnostic>) {
    let templates = [
        config.api.token_uri.as_str(),
        config.api.file_upload_uri.as_str(),
        config.api.file_download_uri.as_str(),
    ];
    for ((path, required), template) in TEMPLATE_PLACEHOLDERS.iter().zip(templates) {
        for placeholder in *required {
            if !template.contains(placeholder) {
                diagnostics.push(Diagnostic::new(
                    Severity::Error,
                    "template",
                    *path,
                    format!("template is missing the {placeholder} placeholder"),
                ));
            }
        }
        if !template.starts_with("http://") && !template.starts_with("https://") {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "template",
                *path,
                "template must be an http(s) URL",
            ));
        }
    }

    if config.media.media_path.as_os_str().is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "media",
            "media.media_path",
            "media_path must not be empty",
        ));
    }

    let mut keys: Vec<_> = config.media.extensions.keys().collect();
    keys.sort();
    for key in keys {
        let path = format!("media.extensions.{key}");
        if !MEDIA_TYPE_NAMES.contains(&key.as_str()) {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "media",
                path,
                format!(
                    "unknown media type `{key}` (expected one of {})",
                    MEDIA_TYPE_NAMES.join(", ")
                ),
            ));
            continue;
        }
        let ext = &config.media.extensions[key];
        if !ext.starts_with('.') || ext.len() < 2 || ext.contains(['/', '\\']) {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "media",
                path,
                format!("extension `{ext}` must look like `.jpg`"),
            ));
        }
    }

    if !config.account.has_credentials() {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "credentials",
            "account",
            "app_id/app_secret not set; a static access token must be supplied",
        ));
    }

    if config.http.timeout_secs == Some(0) {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "http",
            "http.timeout_secs",
            "timeout_secs must be greater than zero",
        ));
    }
}
