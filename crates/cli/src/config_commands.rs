use std::path::{Path, PathBuf};

use {
    anyhow::Result,
    clap::Subcommand,
    wxmedia_config::validate::{self, Severity},
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration with secrets masked.
    Show,
    /// Write a documented default config file.
    Init {
        /// Destination (defaults to the user config directory).
        #[arg(long)]
        path: Option<PathBuf>,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Validate the configuration file and report errors/warnings.
    Validate {
        /// File to check (defaults to --config or the discovered file).
        path: Option<PathBuf>,
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
}

pub fn handle_config(action: ConfigAction, config_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Show => show(config_path),
        ConfigAction::Init { path, force } => {
            let path = path
                .or_else(|| config_path.map(Path::to_path_buf))
                .unwrap_or_else(wxmedia_config::find_or_default_config_path);
            init(&path, force)?;
            eprintln!("Wrote {}", path.display());
            Ok(())
        },
        ConfigAction::Validate { path, verbose } => {
            let ok = check(path.as_deref().or(config_path), verbose);
            if !ok {
                std::process::exit(1);
            }
            Ok(())
        },
    }
}

fn show(config_path: Option<&Path>) -> Result<()> {
    let config = crate::load_config(config_path)?;
    print!("{}", config.to_redacted_toml()?);
    Ok(())
}

fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, wxmedia_config::default_config_template())?;
    Ok(())
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Print diagnostics; returns `false` when any error was found.
fn check(path: Option<&Path>, verbose: bool) -> bool {
    let result = validate::validate(path);

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults.\n");
    }

    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let color = match d.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
            Severity::Info => CYAN,
        };

        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{}{RESET} {}", d.severity, d.message);
        } else {
            eprintln!("  {BOLD}{color}{}{RESET} {}: {}", d.severity, d.path, d.message);
        }
        shown += 1;
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if shown > 0 {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    errors == 0
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_template_and_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf/wxmedia.toml");

        init(&path, false).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, wxmedia_config::default_config_template());

        let err = init(&path, false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        init(&path, true).unwrap();
    }

    #[test]
    fn check_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.toml");
        std::fs::write(&good, "[account]\napp_id = \"a\"\napp_secret = \"b\"\n").unwrap();
        assert!(check(Some(&good), false));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[api]\nfile_upload_uri = \"https://x/upload\"\n").unwrap();
        assert!(!check(Some(&bad), true));
    }
}
