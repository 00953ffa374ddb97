mod config_commands;
mod media_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
    wxmedia_config::WxMediaConfig,
};

#[derive(Parser)]
#[command(name = "wxmedia", about = "Upload and download media through the platform API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to use instead of the discovered one.
    #[arg(long, global = true, env = "WXMEDIA_CONFIG")]
    config: Option<PathBuf>,

    /// Use this access token instead of requesting one with the app credentials.
    #[arg(long, global = true, env = "WXMEDIA_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a local file and print its media id.
    Upload {
        /// File to upload.
        file: PathBuf,
        /// Media type (image, voice, video, thumb).
        #[arg(long = "type", short = 't')]
        media_type: wxmedia_media::MediaType,
    },
    /// Download media into the media directory and print the local path.
    Download {
        media_id: String,
        #[arg(long = "type", short = 't')]
        media_type: wxmedia_media::MediaType,
    },
    /// Fetch raw media bytes without touching the media directory.
    Fetch {
        media_id: String,
        #[arg(long = "type", short = 't')]
        media_type: wxmedia_media::MediaType,
        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<WxMediaConfig> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            Ok(wxmedia_config::apply_env_overrides(
                wxmedia_config::load_config(path)?,
            ))
        },
        None => Ok(wxmedia_config::discover_and_load()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "wxmedia starting");

    match cli.command {
        Commands::Config { action } => {
            config_commands::handle_config(action, cli.config.as_deref())
        },
        Commands::Upload { file, media_type } => {
            let config = load_config(cli.config.as_deref())?;
            let client = media_commands::build_client(&config, cli.token)?;
            media_commands::upload(&client, &file, media_type).await
        },
        Commands::Download {
            media_id,
            media_type,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let client = media_commands::build_client(&config, cli.token)?;
            media_commands::download(&client, &media_id, media_type).await
        },
        Commands::Fetch {
            media_id,
            media_type,
            output,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let client = media_commands::build_client(&config, cli.token)?;
            media_commands::fetch(&client, &media_id, media_type, output.as_deref()).await
        },
    }
}
