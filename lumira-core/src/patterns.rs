//! Compiled regex pattern sets.

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::types::Result;

/// Future tense, promise and intent markers.
pub const FUTURE_TENSE_PATTERNS: &[&str] = &[
    r"\b(will|shall|going to|gonna|plan to|intend to|promise to|commit to|guarantee to)\b",
    r"\b(soon|later|eventually|tomorrow|next|future|ahead|coming)\b",
    r"\b(expect|anticipate|look forward to|hope to|wish to|want to)\b",
];

/// Negation markers.
pub const NEGATION_PATTERNS: &[&str] = &[
    r"\b(not|no|never|nothing|nobody|nowhere|neither|nor|none|n't|won't|can't|don't|doesn't|didn't|haven't|hasn't|hadn't|shouldn't|wouldn't|couldn't|mustn't)\b",
    r"\b(without|lack|missing|absent|devoid|free from|exempt from)\b",
];

/// Planning, timing and farewell language that escalates suicide intent.
pub const ESCALATION_PATTERNS: &[&str] = &[
    r"\b(plan|planning|planned|plans)\b.*\b(suicide|kill|end|die)\b",
    r"\b(method|way|how)\b.*\b(suicide|kill|end|die)\b",
    r"\b(when|where|time)\b.*\b(suicide|kill|end|die)\b",
    r"\b(tonight|today|tomorrow|soon)\b.*\b(suicide|kill|end|die)\b",
    r"\b(goodbye|farewell|last time|final)\b",
    r"\b(letter|note|message)\b.*\b(suicide|kill|end|die)\b",
];

/// A set of case-insensitive regex patterns.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    /// Compile a pattern set; fails on the first invalid pattern.
    pub fn new<S: AsRef<str>>(sources: &[S]) -> Result<Self> {
        let patterns = sources
            .iter()
            .map(|source| compile(source.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Bundled future tense patterns.
    pub fn future_tense() -> Self {
        Self::bundled(FUTURE_TENSE_PATTERNS)
    }

    /// Bundled negation patterns.
    pub fn negation() -> Self {
        Self::bundled(NEGATION_PATTERNS)
    }

    /// Bundled escalation patterns.
    pub fn escalation() -> Self {
        Self::bundled(ESCALATION_PATTERNS)
    }

    fn bundled(sources: &[&str]) -> Self {
        let patterns = sources
            .iter()
            .filter_map(|source| match compile(source) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    warn!(pattern = %source, error = %e, "Skipping bundled pattern");
                    debug_assert!(false, "bundled pattern {source:?} failed to compile: {e}");
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    /// Whether any pattern matches.
    pub fn is_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(text))
    }

    /// Total number of non-overlapping matches across all patterns.
    pub fn count_matches(&self, text: &str) -> usize {
        self.patterns.iter().map(|p| p.find_iter(text).count()).sum()
    }

    /// Pattern sources.
    pub fn sources(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn compile(source: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(source).case_insensitive(true).build()
}
