//! # logqa CLI
//!
//! Ask natural-language questions about a log file. The file is split into
//! line-aligned chunks, embedded, and searched by similarity; the best
//! matches are handed to a chat model with instructions to answer only from
//! them.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `logqa split <file>` | Show how a file is chunked (no network) |
//! | `logqa ask <file> "<question>"` | Answer one question |
//! | `logqa chat <file>` | Interactive question loop with history |
//! | `logqa serve` | HTTP server with a password-protected session |
//!
//! ## Examples
//!
//! ```bash
//! export OPENAI_API_KEY=sk-...
//! logqa ask ./app.log "Why did the worker restart at 14:02?"
//! logqa chat ./app.log --config ./logqa.toml
//! LOGQA_PASSWORD=secret logqa serve --bind 0.0.0.0:8501
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use logqa::progress::ProgressMode;
use logqa::{commands, config, server};

#[derive(Parser)]
#[command(
    name = "logqa",
    about = "Ask questions about log files, answered from retrieved log excerpts",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// When omitted, `./logqa.toml` is used if present, otherwise built-in
    /// defaults (OpenAI embeddings and `gpt-4`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Upload progress on stderr. Defaults to `human` on a TTY, else `off`.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the chunks a log file is split into.
    ///
    /// Runs locally; no embedding or model calls are made.
    Split {
        /// Log file to split.
        file: PathBuf,

        /// Soft chunk size in chars (overrides `[chunking].limit`).
        #[arg(long)]
        limit: Option<usize>,

        /// Emit chunks as a JSON array.
        #[arg(long)]
        json: bool,
    },

    /// Answer a single question about a log file.
    Ask {
        /// Log file to index.
        file: PathBuf,

        /// The question.
        question: String,

        /// Number of excerpts to retrieve (overrides `[retrieval].top_k`).
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Load a log file and answer questions read from stdin.
    Chat {
        /// Log file to index.
        file: PathBuf,

        /// Number of excerpts to retrieve (overrides `[retrieval].top_k`).
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Start the HTTP server.
    ///
    /// Requires the password variable named by `[server].password_env`
    /// (default `LOGQA_PASSWORD`).
    Serve {
        /// Address to bind (overrides `[server].bind`).
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_or_default(cli.config.as_deref())?;
    let progress = cli.progress.unwrap_or_else(ProgressMode::default_for_tty);

    match cli.command {
        Commands::Split { file, limit, json } => {
            commands::run_split(&cfg, &file, limit, json)?;
        }
        Commands::Ask {
            file,
            question,
            top_k,
        } => {
            commands::run_ask(&cfg, &file, &question, top_k, progress).await?;
        }
        Commands::Chat { file, top_k } => {
            commands::run_chat(&cfg, &file, top_k, progress).await?;
        }
        Commands::Serve { bind } => {
            server::run_server(&cfg, bind, progress).await?;
        }
    }

    Ok(())
}
