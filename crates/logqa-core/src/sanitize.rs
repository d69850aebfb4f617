//! Denylist filter for prompt-override attempts.
//!
//! A question containing any denylisted phrase (case-insensitive substring
//! match) is replaced wholesale by [`BLOCKED_INPUT_WARNING`]. The
//! replacement still flows through retrieval and the model call; it is not
//! rejected.
//!
//! This is a naive substring filter. Paraphrase, inserted punctuation, or
//! translation all slip past it. It deters casual attempts and nothing more.

/// Text that replaces a blocked question.
pub const BLOCKED_INPUT_WARNING: &str = "[Potential prompt injection detected - input blocked]";

/// Phrases that trigger replacement. Lower-case.
pub const DEFAULT_BLOCKED_PATTERNS: &[&str] = &[
    "ignore previous",
    "ignore all previous",
    "disregard instructions",
    "disregard previous",
    "disregard rules",
    "system prompt",
    "override rules",
];

/// Outcome of sanitising one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sanitized {
    /// No pattern matched; the question is passed through unchanged.
    Clean(String),
    /// A pattern matched; carries the warning text and the matched pattern.
    Blocked { text: String, pattern: String },
}

impl Sanitized {
    /// The text to use as "the question" for the rest of the pipeline.
    pub fn text(&self) -> &str {
        match self {
            Sanitized::Clean(text) => text,
            Sanitized::Blocked { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Sanitized::Clean(text) => text,
            Sanitized::Blocked { text, .. } => text,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Sanitized::Blocked { .. })
    }
}

/// Case-insensitive substring denylist.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    patterns: Vec<String>,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}

impl Sanitizer {
    /// Build a sanitizer from the default patterns plus `extra`.
    ///
    /// Extra patterns are trimmed and lower-cased; blank ones are ignored.
    pub fn new<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns: Vec<String> = DEFAULT_BLOCKED_PATTERNS
            .iter()
            .map(|p| p.to_string())
            .collect();
        for p in extra {
            let p = p.as_ref().trim().to_lowercase();
            if !p.is_empty() && !patterns.contains(&p) {
                patterns.push(p);
            }
        }
        Self { patterns }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Check `question` against the denylist.
    pub fn sanitize(&self, question: &str) -> Sanitized {
        let lowered = question.to_lowercase();
        match self.patterns.iter().find(|p| lowered.contains(p.as_str())) {
            Some(pattern) => Sanitized::Blocked {
                text: BLOCKED_INPUT_WARNING.to_string(),
                pattern: pattern.clone(),
            },
            None => Sanitized::Clean(question.to_string()),
        }
    }
}

/// Sanitise with the default denylist only.
pub fn sanitize_question(question: &str) -> Sanitized {
    Sanitizer::default().sanitize(question)
}
