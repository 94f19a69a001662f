mod commands;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use slugrelay_core::config::DEFAULT_CONFIG_FILE;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "slugrelay",
    about = "Relay build artifacts into platform releases"
)]
#[command(version)]
struct Cli {
    /// Path to slugrelay.toml
    #[arg(long, global = true, env = "SLUGRELAY_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP relay
    Serve {
        /// Listen address (overrides [server] bind)
        #[arg(long, env = "SLUGRELAY_BIND")]
        bind: Option<SocketAddr>,
    },
    /// Check that the packaging tools are installed
    Doctor,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_logging(format: LogFormat) {
    // arch-lint: allow(no-silent-result-drop) reason="an unset or invalid RUST_LOG falls back to the info level"
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(fmt::layer()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is the normal case outside local development.
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    let cli = Cli::parse();
    init_logging(cli.log_format);
    tracing::debug!(dotenv = dotenv_loaded, config = %cli.config.display(), "starting");

    match cli.command {
        Commands::Serve { bind } => commands::serve(&cli.config, bind).await?,
        Commands::Doctor => commands::doctor(&cli.config).await?,
    }

    Ok(())
}
