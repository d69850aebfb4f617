//! Upload progress reporting.
//!
//! Reports what happens while a log file is chunked and embedded so users
//! of large files see how much is left. Progress goes to **stderr** so
//! stdout stays parseable (answers, `split --json` output).

use std::io::Write;

/// A single progress event for an upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadProgressEvent {
    /// `n` of `total` chunks embedded.
    Embedding { name: String, n: u64, total: u64 },
    /// Store built and active.
    Ready {
        name: String,
        chunks: u64,
        dims: u64,
    },
}

/// Reports upload progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: UploadProgressEvent);
}

/// Human-friendly progress on stderr: "upload app.log  embedding  1,200 / 5,000 chunks".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: UploadProgressEvent) {
        let line = match &event {
            UploadProgressEvent::Embedding { name, n, total } => format!(
                "upload {}  embedding  {} / {} chunks\n",
                name,
                format_number(*n),
                format_number(*total)
            ),
            UploadProgressEvent::Ready { name, chunks, dims } => format!(
                "upload {}  ready  {} chunks, {} dims\n",
                name,
                format_number(*chunks),
                dims
            ),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: UploadProgressEvent) {
        let obj = match &event {
            UploadProgressEvent::Embedding { name, n, total } => serde_json::json!({
                "event": "progress",
                "upload": name,
                "phase": "embedding",
                "n": n,
                "total": total
            }),
            UploadProgressEvent::Ready { name, chunks, dims } => serde_json::json!({
                "event": "progress",
                "upload": name,
                "phase": "ready",
                "chunks": chunks,
                "dims": dims
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: UploadProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len().saturating_sub(1)) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

/// Audit line for a question replaced by the sanitiser. Always printed.
pub fn report_blocked(session: &str, pattern: &str) {
    let _ = writeln!(
        std::io::stderr().lock(),
        "sanitize  session {}  blocked question (matched {:?})",
        session,
        pattern
    );
}
