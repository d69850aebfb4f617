//! Implementations of the `split`, `ask`, and `chat` CLI commands.
//!
//! Answers and chunk listings go to stdout; progress, audit lines, and
//! errors that do not end the process go to stderr.

use anyhow::{bail, Result};
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

use logqa_core::chunk::split_logs;
use logqa_core::session::{AskOutcome, Session};

use crate::config::Config;
use crate::ingest::{decode_log, open_session, upload_file};
use crate::progress::{report_blocked, ProgressMode};

/// `logqa split`: print the chunks a file would be indexed as.
pub fn run_split(config: &Config, path: &Path, limit: Option<usize>, json: bool) -> Result<()> {
    let limit = limit.unwrap_or(config.chunking.limit);
    if limit == 0 {
        bail!("--limit must be > 0");
    }

    let bytes = std::fs::read(path)
        .map_err(|e| anyhow::anyhow!("Failed to read log file {}: {}", path.display(), e))?;
    let text = decode_log(bytes)?;
    let chunks = split_logs(&text, limit);

    if json {
        let out: Vec<serde_json::Value> = chunks
            .iter()
            .enumerate()
            .map(|(i, c)| {
                serde_json::json!({
                    "index": i,
                    "chars": c.chars().count(),
                    "text": c,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if chunks.is_empty() {
        println!("No chunks.");
        return Ok(());
    }
    for (i, chunk) in chunks.iter().enumerate() {
        println!("--- chunk {} ({} chars) ---", i, chunk.chars().count());
        println!("{}", chunk);
    }
    println!("{} chunks", chunks.len());
    Ok(())
}

fn require_embeddings(config: &Config) -> Result<()> {
    if !config.embedding.is_enabled() {
        bail!("Answering questions requires embeddings. Set [embedding] provider in config.");
    }
    Ok(())
}

fn apply_top_k(session_config: &Config, top_k: Option<usize>) -> Result<Config> {
    let mut config = session_config.clone();
    if let Some(k) = top_k {
        if k == 0 {
            bail!("--top-k must be >= 1");
        }
        config.retrieval.top_k = k;
    }
    Ok(config)
}

fn audit(session: &Session, outcome: &AskOutcome) {
    if let Some(pattern) = &outcome.blocked_pattern {
        report_blocked(&session.id().to_string(), pattern);
    }
}

/// `logqa ask`: upload one file, answer one question, print the answer.
pub async fn run_ask(
    config: &Config,
    path: &Path,
    question: &str,
    top_k: Option<usize>,
    progress: ProgressMode,
) -> Result<()> {
    if question.trim().is_empty() {
        bail!("question must not be empty");
    }
    require_embeddings(config)?;
    let config = apply_top_k(config, top_k)?;

    let mut session = open_session(&config)?;
    upload_file(&mut session, path, progress.reporter().as_ref()).await?;

    let outcome = session.ask(question).await?;
    audit(&session, &outcome);
    println!("{}", outcome.entry.answer);
    Ok(())
}

/// `logqa chat`: upload one file, then answer questions read from stdin
/// until EOF or `:quit`.
///
/// A failed question prints an error and the loop continues, so the user
/// can retry. `:history` prints the session history and `:doc` shows the
/// active upload. History lasts as long as the session.
pub async fn run_chat(
    config: &Config,
    path: &Path,
    top_k: Option<usize>,
    progress: ProgressMode,
) -> Result<()> {
    require_embeddings(config)?;
    let config = apply_top_k(config, top_k)?;

    let mut session = open_session(&config)?;
    let info = upload_file(&mut session, path, progress.reporter().as_ref()).await?;

    let interactive = atty::is(atty::Stream::Stdin);
    if interactive {
        println!(
            "Loaded {} ({} lines, {} chunks). Ask a question, or :help.",
            info.name, info.lines, info.chunks
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if interactive {
            print!("> ");
            std::io::stdout().flush()?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        match input {
            "" => continue,
            ":quit" | ":q" | ":exit" => break,
            ":help" => {
                println!(":history  show questions and answers");
                println!(":doc      show the loaded file");
                println!(":quit     exit");
            }
            ":history" => print_history(&session),
            ":doc" => {
                if let Some(doc) = session.document() {
                    println!(
                        "{}  sha256 {}  {} bytes, {} lines, {} chunks, {} dims",
                        doc.name, doc.sha256, doc.bytes, doc.lines, doc.chunks, doc.dims
                    );
                }
            }
            cmd if cmd.starts_with(':') => {
                eprintln!("unknown command {} (try :help)", cmd);
            }
            question => match session.ask(question).await {
                Ok(outcome) => {
                    audit(&session, &outcome);
                    println!("{}", outcome.entry.answer);
                }
                Err(e) => eprintln!("error: {}", e),
            },
        }
    }

    Ok(())
}

fn print_history(session: &Session) {
    let history = session.history();
    if history.is_empty() {
        println!("No questions yet.");
        return;
    }
    for (i, entry) in history.iter().enumerate() {
        let n = i + 1;
        println!(
            "Q{} [{}]: {}",
            n,
            entry
                .asked_at
                .with_timezone(&chrono::Local)
                .format("%H:%M:%S"),
            entry.question
        );
        println!("A{}: {}", n, entry.answer);
        println!("---");
    }
}
