//! # folio CLI
//!
//! The `folio` binary answers questions about a developer's portfolio. It
//! discovers the owner's repositories tagged with a topic, reads each README,
//! indexes them, and lets a hosted reasoning model answer through a small
//! set of tools.
//!
//! ## Usage
//!
//! ```bash
//! folio --config ./config/folio.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `folio sync` | Discover, clone/pull, and list the loaded documents |
//! | `folio search "<query>"` | Print the top-k matching README fragments |
//! | `folio tools` | List the tools the assistant exposes |
//! | `folio ask "<question>"` | Answer one question |
//! | `folio chat` | Interactive chat on stdin |
//! | `folio serve` | Start the HTTP API |

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use folio::commands;
use folio::config::{self, DEFAULT_CONFIG_PATH};
use folio::progress::ProgressMode;

/// folio: a portfolio assistant over your GitHub READMEs.
///
/// Configuration comes from an optional TOML file plus environment variables
/// (`GITHUB_USERNAME`, `MY_NAME`, `GOOGLE_API_KEY`, ...). A `.env` file in the
/// working directory is loaded first.
#[derive(Parser)]
#[command(name = "folio", version, about = "Portfolio assistant over your project READMEs")]
struct Cli {
    /// Path to the configuration file (TOML). Missing file means defaults.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Sync progress on stderr. Defaults to `human` on a TTY, else `off`.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProgressArg {
    Off,
    Human,
    Json,
}

impl From<ProgressArg> for ProgressMode {
    fn from(arg: ProgressArg) -> Self {
        match arg {
            ProgressArg::Off => ProgressMode::Off,
            ProgressArg::Human => ProgressMode::Human,
            ProgressArg::Json => ProgressMode::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Discover and sync the portfolio repositories, then list the documents.
    ///
    /// Repositories already cloned are pulled; new ones are cloned into
    /// `[corpus] clone_dir`. Prints each document and the corpus fingerprint.
    Sync,

    /// Search README fragments by similarity.
    Search {
        /// The search query string.
        query: String,

        /// Number of fragments to return (defaults to `[retrieval] top_k`).
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// List the tools exposed to the reasoning model.
    Tools,

    /// Ask one question and print the answer.
    Ask {
        /// The question.
        question: String,
    },

    /// Interactive chat. Type `exit` or `quit` to leave.
    Chat,

    /// Start the HTTP API on `[server] bind`.
    Serve,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("folio=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    let mode = cli
        .progress
        .map(ProgressMode::from)
        .unwrap_or_else(ProgressMode::default_for_tty);
    let progress = mode.reporter();

    match cli.command {
        Commands::Sync => commands::run_sync(&cfg, progress.as_ref()).await?,
        Commands::Search { query, k } => {
            commands::run_search(&cfg, &query, k, progress.as_ref()).await?
        }
        Commands::Tools => commands::run_tools(&cfg)?,
        Commands::Ask { question } => {
            commands::run_ask(&cfg, &question, progress.as_ref()).await?
        }
        Commands::Chat => commands::run_chat(&cfg, progress.as_ref()).await?,
        Commands::Serve => commands::run_serve(&cfg, progress.as_ref()).await?,
    }

    Ok(())
}
