//! wander-photos - travel photo edge proxy
//!
//! Serves trip galleries straight out of shared OneDrive folders via
//! Microsoft Graph.

mod api;
mod auth;
mod config;
mod manifest;
mod models;
mod server;
mod share;
mod trips;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "wander-photos")]
#[command(about = "Travel photo proxy over OneDrive shared folders", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP proxy
    Serve {
        /// Listen address, e.g. 127.0.0.1:8787
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Print the Graph share id for a OneDrive sharing URL
    Encode {
        /// OneDrive sharing URL
        url: Option<String>,
    },

    /// List configured trips
    Trips,

    /// Fetch a trip's photo listing
    Photos {
        /// Trip name (case-insensitive)
        #[arg(short, long)]
        trip: String,

        /// Maximum number of photos to return
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Show which credentials and settings are configured
    Status,

    /// Write a static `<trip>.json` manifest for every configured trip
    Manifest {
        /// Output directory
        #[arg(short, long, default_value = manifest::DEFAULT_MANIFEST_DIR)]
        out_dir: PathBuf,

        /// Maximum number of photos per trip
        #[arg(short, long, default_value = "200")]
        limit: usize,
    },
}

const ENCODE_USAGE: &str = "Usage: wander-photos encode <onedrive-share-url>";

/// Print the share id for `url`, or usage when it is missing. Returns the
/// process exit code.
fn encode(url: Option<&str>, out: &mut impl Write, err: &mut impl Write) -> io::Result<i32> {
    match url {
        Some(url) => {
            writeln!(out, "{}", share::encode_sharing_url(url))?;
            Ok(0)
        }
        None => {
            writeln!(err, "{}", ENCODE_USAGE)?;
            Ok(1)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Encode { url } => {
            let code = encode(url.as_deref(), &mut io::stdout(), &mut io::stderr())?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Serve { bind } => {
            let mut config = Config::load(cli.config.as_deref())?;
            if bind.is_some() {
                config.bind = bind;
            }
            server::serve(config).await?;
        }
        Commands::Trips => {
            let config = Config::load(cli.config.as_deref())?;
            api::list_trips(&config)?;
        }
        Commands::Photos { trip, limit } => {
            let config = Config::load(cli.config.as_deref())?;
            tracing::info!("Fetching photos for {}...", trip);
            api::list_photos(&config, &trip, limit.clamp(1, 200)).await?;
        }
        Commands::Status => {
            let config = Config::load(cli.config.as_deref())?;
            auth::status(&config);
        }
        Commands::Manifest { out_dir, limit } => {
            let config = Config::load(cli.config.as_deref())?;
            let code = manifest::run(&config, &out_dir, limit.clamp(1, 200)).await?;
            if code != 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}
