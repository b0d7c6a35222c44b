//! Incongruence detection.
//!
//! Looks for mismatches between stated intent and linguistic markers:
//! - **Future-tense negation**: a promise or intent phrased with negation
//! - **Conflicting emotions**: opposing emotions both strongly present
//! - **Claim contradiction**: a negated claim the text does not support

use serde::Serialize;
use tracing::debug;

use lumira_core::{
    Emotion, EmotionConflict, EmotionScore, IntegrityLevel, IntegritySignal, PatternSet,
};

/// Opposing emotion pairs checked for conflicts.
pub const CONFLICTING_PAIRS: [(Emotion, Emotion); 5] = [
    (Emotion::Joy, Emotion::Sadness),
    (Emotion::Love, Emotion::Contempt),
    (Emotion::Trust, Emotion::Fear),
    (Emotion::Pride, Emotion::Shame),
    (Emotion::Anticipation, Emotion::Fear),
];

/// Negation words recognized inside claims.
const CLAIM_NEGATIONS: &[&str] = &["not", "never", "no"];

/// Indicator tag for the future-tense negation rule.
pub const FUTURE_TENSE_NEGATION: &str = "future_tense_negation";

/// A claim the text appears to contradict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contradiction {
    /// The claim as supplied
    pub claim: String,
    /// Negation word present in the claim but not in the text
    pub negation: String,
    /// Leading part of the text
    pub text_excerpt: String,
}

/// Detector for incongruence between intent and language.
#[derive(Debug, Clone)]
pub struct IncongruenceDetector {
    /// Future tense / intent patterns
    future: PatternSet,
    /// Negation patterns
    negation: PatternSet,
    /// Minimum score for both sides of a conflicting pair
    conflict_threshold: f64,
}

impl IncongruenceDetector {
    /// Create a detector with the bundled patterns.
    pub fn new() -> Self {
        Self::with_patterns(PatternSet::future_tense(), PatternSet::negation())
    }

    /// Create with custom pattern sets.
    pub fn with_patterns(future: PatternSet, negation: PatternSet) -> Self {
        Self {
            future,
            negation,
            conflict_threshold: 0.3,
        }
    }

    /// Set the conflict threshold.
    pub fn with_conflict_threshold(mut self, threshold: f64) -> Self {
        self.conflict_threshold = threshold;
        self
    }

    /// Future tense match count.
    pub fn future_tense_count(&self, text: &str) -> usize {
        self.future.count_matches(text)
    }

    /// Negation match count.
    pub fn negation_count(&self, text: &str) -> usize {
        self.negation.count_matches(text)
    }

    /// Detect incongruence signals in text.
    pub fn detect(&self, text: &str) -> Vec<IntegritySignal> {
        self.future_negation(text).into_iter().collect()
    }

    /// Detect incongruence signals, also checking caller-supplied claims.
    pub fn detect_with_claims<S: AsRef<str>>(&self, text: &str, claims: &[S]) -> Vec<IntegritySignal> {
        let mut signals = self.detect(text);

        for contradiction in self.find_contradictions(text, claims) {
            signals.push(
                IntegritySignal::new(
                    IntegrityLevel::Medium,
                    format!(
                        "Contradiction detected: Claim '{}' contradicts text",
                        contradiction.claim
                    ),
                )
                .with_weight(0.7)
                .with_detail("claim", &contradiction.claim)
                .with_detail("negation", &contradiction.negation)
                .with_detail("text_excerpt", &contradiction.text_excerpt),
            );
        }

        signals
    }

    /// Future-tense promise combined with negation. Fires at most once.
    pub fn future_negation(&self, text: &str) -> Option<IntegritySignal> {
        if !(self.future.is_match(text) && self.negation.is_match(text)) {
            return None;
        }

        let future_count = self.future_tense_count(text);
        let negation_count = self.negation_count(text);
        debug!(
            future_tense_count = future_count,
            negation_count = negation_count,
            "Future-tense negation detected"
        );

        Some(
            IntegritySignal::new(
                IntegrityLevel::Low,
                "Future-tense promise with negation detected",
            )
            .with_weight(0.3)
            .with_detail("pattern", FUTURE_TENSE_NEGATION)
            .with_detail("future_tense_count", future_count)
            .with_detail("negation_count", negation_count),
        )
    }

    /// Opposing emotion pairs where both scores exceed the threshold.
    pub fn emotion_conflicts(&self, scores: &[EmotionScore]) -> Vec<EmotionConflict> {
        let score_of = |emotion: Emotion| {
            scores
                .iter()
                .find(|s| s.name == emotion)
                .map_or(0.0, |s| s.score)
        };

        CONFLICTING_PAIRS
            .iter()
            .filter_map(|&(positive, negative)| {
                let positive_score = score_of(positive);
                let negative_score = score_of(negative);
                (positive_score > self.conflict_threshold
                    && negative_score > self.conflict_threshold)
                    .then_some(EmotionConflict {
                        positive,
                        negative,
                        positive_score,
                        negative_score,
                    })
            })
            .collect()
    }

    /// Indicator tags for the text given its emotion scores.
    pub fn indicators(&self, text: &str, scores: &[EmotionScore]) -> Vec<String> {
        let mut indicators = Vec::new();
        if self.future_negation(text).is_some() {
            indicators.push(FUTURE_TENSE_NEGATION.to_string());
        }
        indicators.extend(self.emotion_conflicts(scores).iter().map(|c| c.indicator()));
        indicators
    }

    /// Claims carrying a negation the text lacks while sharing other words with it.
    pub fn find_contradictions<S: AsRef<str>>(&self, text: &str, claims: &[S]) -> Vec<Contradiction> {
        let text_lower = text.to_lowercase();
        let text_tokens = tokens(&text_lower);

        claims
            .iter()
            .filter_map(|claim| {
                let claim = claim.as_ref();
                let claim_lower = claim.to_lowercase();
                let claim_tokens = tokens(&claim_lower);

                let negation = claim_tokens
                    .iter()
                    .find(|t| CLAIM_NEGATIONS.contains(*t) && !text_tokens.contains(*t))?;

                let shares_words = claim_tokens
                    .iter()
                    .filter(|t| !CLAIM_NEGATIONS.contains(*t))
                    .any(|t| text_lower.contains(*t));
                if !shares_words {
                    return None;
                }

                Some(Contradiction {
                    claim: claim.to_string(),
                    negation: negation.to_string(),
                    text_excerpt: leading_excerpt(text, 100),
                })
            })
            .collect()
    }
}

impl Default for IncongruenceDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Whitespace tokens with surrounding punctuation stripped.
fn tokens(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
        .filter(|t| !t.is_empty())
        .collect()
}

/// First `max_chars` characters, with `...` appended when cut.
fn leading_excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
