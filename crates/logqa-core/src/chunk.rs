//! Line-boundary log chunker.
//!
//! Splits raw log text into chunks of whole lines whose accumulated length
//! stays under a soft `limit` (counted in chars). Lines are never split: a
//! single line longer than `limit` becomes a chunk of its own.
//!
//! # Algorithm
//!
//! 1. Split the text on `\n`, keeping line order.
//! 2. Append each line (plus its newline) to a buffer while
//!    `buffer_len + line_len < limit`.
//! 3. Otherwise flush the trimmed buffer as a chunk and start a new buffer
//!    with the overflowing line.
//! 4. Flush whatever is left after the last line.
//!
//! Chunks that are empty after trimming are dropped, so empty or
//! whitespace-only input yields no chunks at all.
//!
//! # Example
//!
//! ```rust
//! use logqa_core::chunk::split_logs;
//!
//! let chunks = split_logs("line1\nline2\nline3", 500);
//! assert_eq!(chunks, vec!["line1\nline2\nline3".to_string()]);
//! assert!(split_logs("", 500).is_empty());
//! ```

/// Soft chunk size, in chars, used when no limit is configured.
pub const DEFAULT_CHUNK_LIMIT: usize = 500;

/// Split log text into chunks of whole lines, respecting `limit`.
///
/// # Guarantees
///
/// - Deterministic: the same input always yields the same chunks.
/// - Chunks come out in original line order.
/// - Every non-blank input line lands in exactly one chunk.
/// - A chunk is shorter than `limit` chars unless it is a single overlong line.
/// - No chunk is empty.
pub fn split_logs(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut buf_chars = 0usize;

    for line in text.split('\n') {
        let line_chars = line.chars().count();

        if buf_chars + line_chars >= limit {
            flush(&mut chunks, &buf);
            buf.clear();
            buf_chars = 0;
        }

        buf.push_str(line);
        buf.push('\n');
        buf_chars += line_chars + 1;
    }

    flush(&mut chunks, &buf);
    chunks
}

fn flush(chunks: &mut Vec<String>, buf: &str) {
    let trimmed = buf.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
