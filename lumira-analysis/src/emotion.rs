//! Lexicon-based emotion scoring.

use tracing::debug;

use lumira_core::{word_count, Emotion, EmotionScore, LexiconTable, MatchMode, TextSample};

/// Scores samples against an emotion lexicon.
///
/// A category's score is the number of its terms present in the text times
/// the category weight, divided by the sample's word count and capped at 1.0.
#[derive(Debug, Clone)]
pub struct EmotionScorer {
    /// Injected lexicon
    lexicon: LexiconTable,
    /// Term matching mode
    mode: MatchMode,
}

impl EmotionScorer {
    /// Create a scorer with the bundled lexicon.
    pub fn new() -> Self {
        Self::with_lexicon(LexiconTable::builtin())
    }

    /// Create with a custom lexicon.
    pub fn with_lexicon(lexicon: LexiconTable) -> Self {
        Self {
            lexicon,
            mode: MatchMode::default(),
        }
    }

    /// Set the term matching mode.
    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn lexicon(&self) -> &LexiconTable {
        &self.lexicon
    }

    pub fn match_mode(&self) -> MatchMode {
        self.mode
    }

    /// Number of lexicon terms present per emotion, in lexicon order.
    pub fn term_counts(&self, text: &str) -> Vec<(Emotion, usize)> {
        let lower = text.to_lowercase();
        self.lexicon
            .entries()
            .iter()
            .map(|entry| {
                let matched = entry
                    .terms
                    .iter()
                    .filter(|term| self.mode.contains(&lower, term))
                    .count();
                (entry.emotion, matched)
            })
            .collect()
    }

    /// Classify a sample. Only emotions with a positive score are returned, highest first.
    pub fn classify(&self, sample: &TextSample) -> Vec<EmotionScore> {
        let scores = self.classify_text(&sample.text);
        debug!(
            sample_id = %sample.id,
            emotions = scores.len(),
            "Emotions classified"
        );
        scores
    }

    /// Classify raw text.
    pub fn classify_text(&self, text: &str) -> Vec<EmotionScore> {
        let words = word_count(text);
        if words == 0 {
            return vec![];
        }

        let weights = self.lexicon.entries().iter().map(|e| e.weight);
        let mut scores: Vec<EmotionScore> = self
            .term_counts(text)
            .into_iter()
            .zip(weights)
            .filter_map(|((emotion, matched), weight)| {
                let score = (matched as f64 * weight / words as f64).min(1.0);
                (score > 0.0).then(|| EmotionScore::new(emotion, score))
            })
            .collect();

        // Stable: ties keep lexicon order
        scores.sort_by(|a, b| b.score.total_cmp(&a.score));
        scores
    }
}

impl Default for EmotionScorer {
    fn default() -> Self {
        Self::new()
    }
}
