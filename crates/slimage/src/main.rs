//! Slimage CLI - shrink the images embedded in CSV datasets and image directories.
//!
//! Slimage reads records that carry a base64-encoded image in one column,
//! bounds every image to a maximum width, re-encodes it as JPEG, and writes
//! the records back out in the same order. Pointed at a directory, it does the
//! same for each image file inside it.
//!
//! # Usage
//!
//! ```bash
//! # Shrink the images of a CSV file (writes baches_optimized.csv)
//! slimage process baches.csv
//!
//! # Shrink a directory of images with custom settings
//! slimage process ./photos/ -o ./photos_small --max-width 1024 --quality 80
//!
//! # View configuration
//! slimage config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Slimage - shrink the images embedded in CSV datasets and image directories.
#[derive(Parser, Debug)]
#[command(name = "slimage")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Transcode the images of a CSV file or an image directory
    Process(cli::process::ProcessArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match slimage_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `slimage config path`."
            );
            slimage_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Slimage v{}", slimage_core::VERSION);

    match cli.command {
        Commands::Process(args) => cli::process::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
