//! # Nexus Sources CLI (`nexus-sources`)
//!
//! Inspect the cited sources of an exported Nexus chat transcript.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `nexus-sources sources <file>` | Print the source panel |
//! | `nexus-sources messages <file>` | Print each message with its citation badges |
//! | `nexus-sources show <file> <n>` | Print citation `[n]` in detail |
//!
//! ## Examples
//!
//! ```bash
//! nexus-sources sources ./chat.json
//! nexus-sources messages ./chat.json --json
//! nexus-sources show ./chat.json 2 --config ./config/nexus.toml
//! ```

use clap::{Parser, Subcommand};
use nexus_sources::{config, sources};
use std::path::PathBuf;
use tracing::debug;

/// Nexus Sources CLI — aggregate and inspect chat citations.
#[derive(Parser)]
#[command(
    name = "nexus-sources",
    about = "Nexus Sources — aggregate and inspect the cited sources of a chat transcript",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/nexus.toml`. Built-in defaults are used when
    /// the default file does not exist.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Override `[logging].level` (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

const DEFAULT_CONFIG: &str = "./config/nexus.toml";

#[derive(Subcommand)]
enum Commands {
    /// Print the deduplicated source list of a transcript.
    ///
    /// One entry per cited document, numbered in order of first citation,
    /// with the chunks used sorted by relevance.
    Sources {
        /// Transcript JSON file (array of messages or chat response object).
        transcript: PathBuf,

        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Print each message with the citation badges it shows.
    Messages {
        /// Transcript JSON file.
        transcript: PathBuf,

        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Select one citation by its badge number and print it.
    Show {
        /// Transcript JSON file.
        transcript: PathBuf,

        /// Badge number as displayed, starting at 1.
        number: usize,

        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let explicit_config = cli.config.as_os_str() != DEFAULT_CONFIG;
    let cfg = if cli.config.exists() || explicit_config {
        config::load_config(&cli.config)?
    } else {
        config::Config::minimal()
    };

    let mut logging = cfg.logging.clone();
    if let Some(level) = cli.log_level {
        logging.level = level;
    }
    tracing_subscriber::fmt()
        .with_max_level(logging.max_level()?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    debug!(config = %cli.config.display(), "configuration loaded");

    match cli.command {
        Commands::Sources { transcript, json } => {
            sources::run_sources(&cfg, &transcript, json).await?;
        }
        Commands::Messages { transcript, json } => {
            sources::run_messages(&cfg, &transcript, json).await?;
        }
        Commands::Show {
            transcript,
            number,
            json,
        } => {
            sources::run_show(&cfg, &transcript, number, json).await?;
        }
    }

    Ok(())
}
