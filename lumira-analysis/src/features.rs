//! Surface text features.

use serde::Serialize;

use lumira_core::{Emotion, TextSample};

use crate::emotion::EmotionScorer;
use crate::incongruence::IncongruenceDetector;

/// Lightweight features extracted from a sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextFeatures {
    /// Length in characters
    pub text_length: usize,
    pub word_count: usize,
    /// Segments between runs of sentence terminators
    pub sentence_count: usize,
    pub has_question: bool,
    pub has_exclamation: bool,
    pub has_quotes: bool,
    /// Matched lexicon terms per emotion, lexicon order
    pub emotion_indicators: Vec<(Emotion, usize)>,
    pub future_tense_count: usize,
    pub negation_count: usize,
    /// Incongruence indicator tags
    pub incongruence_indicators: Vec<String>,
}

/// Extract features from a sample.
pub fn featurize(
    sample: &TextSample,
    scorer: &EmotionScorer,
    incongruence: &IncongruenceDetector,
) -> TextFeatures {
    let text = sample.text.as_str();
    let scores = scorer.classify_text(text);

    TextFeatures {
        text_length: text.chars().count(),
        word_count: sample.word_count(),
        sentence_count: sentence_count(text),
        has_question: text.contains('?'),
        has_exclamation: text.contains('!'),
        has_quotes: text.contains('"') || text.contains('\''),
        emotion_indicators: scorer.term_counts(text),
        future_tense_count: incongruence.future_tense_count(text),
        negation_count: incongruence.negation_count(text),
        incongruence_indicators: incongruence.indicators(text, &scores),
    }
}

/// One more than the number of terminator runs (`.`, `!`, `?`).
fn sentence_count(text: &str) -> usize {
    let mut runs = 0;
    let mut in_run = false;
    for c in text.chars() {
        let terminator = matches!(c, '.' | '!' | '?');
        if terminator && !in_run {
            runs += 1;
        }
        in_run = terminator;
    }
    runs + 1
}
