//! Rule-based safety risk detection.
//!
//! This is a non-clinical, keyword-driven detector. It is not a diagnostic
//! tool and must not be used for clinical assessment.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use lumira_core::{
    word_count, IntegrityLevel, IntegritySignal, MatchMode, Meta, PatternSet, RiskFlag, RiskKind,
    RiskLevel, RiskLexicon, TextSample,
};

/// Characters of context kept on each side of the matched term.
const EXCERPT_CONTEXT: usize = 80;

/// Maximum excerpt length in characters, ellipses included.
pub const MAX_EXCERPT_CHARS: usize = 160;

/// Confidence added to suicide intent when an escalation pattern matches.
const ESCALATION_BOOST: f64 = 0.3;

/// Detector for self-harm and related risk language.
#[derive(Debug, Clone)]
pub struct SafetyDetector {
    /// Injected risk lexicon
    lexicon: RiskLexicon,
    /// Escalation patterns
    escalation: PatternSet,
    /// Term matching mode
    mode: MatchMode,
}

impl SafetyDetector {
    /// Create a detector with the bundled lexicon and escalation patterns.
    pub fn new() -> Self {
        Self::with_lexicon(RiskLexicon::builtin(), PatternSet::escalation())
    }

    /// Create with a custom lexicon and escalation patterns.
    pub fn with_lexicon(lexicon: RiskLexicon, escalation: PatternSet) -> Self {
        Self {
            lexicon,
            escalation,
            mode: MatchMode::default(),
        }
    }

    /// Set the term matching mode.
    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn lexicon(&self) -> &RiskLexicon {
        &self.lexicon
    }

    /// Analyze a sample. Flags are ordered by confidence, highest first.
    pub fn analyze(&self, sample: &TextSample) -> Vec<RiskFlag> {
        let lower = sample.text.to_lowercase();
        // Coarse length normalization: one match per ten words saturates.
        let length_factor = (word_count(&lower) as f64 / 10.0).max(1.0);
        let escalated = self.escalation.is_match(&sample.text);

        let mut risks = Vec::new();

        for category in self.lexicon.categories() {
            let matches: Vec<&str> = category
                .terms
                .iter()
                .filter(|term| self.mode.contains(&lower, term))
                .map(String::as_str)
                .collect();

            if matches.is_empty() {
                continue;
            }

            let mut confidence = (matches.len() as f64 / length_factor).min(1.0);
            let mut level = level_for(category.kind, confidence);

            if escalated && category.kind == RiskKind::SuicideIntent {
                level = RiskLevel::High;
                confidence = (confidence + ESCALATION_BOOST).min(1.0);
            }

            debug!(
                sample_id = %sample.id,
                kind = %category.kind,
                level = %level,
                confidence = confidence,
                matches = matches.len(),
                "Risk category matched"
            );

            risks.push(RiskFlag {
                kind: category.kind,
                level,
                confidence,
                excerpt: excerpt(&sample.text, matches[0], self.mode),
                timestamp: sample.timestamp,
            });
        }

        // Stable: ties keep category order
        risks.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        risks
    }

    /// Escalate risks into integrity signals.
    ///
    /// High suicide intent becomes a critical signal and medium self-harm
    /// ideation a high signal. Nothing else escalates.
    pub fn escalate(&self, risks: &[RiskFlag], meta: &Meta) -> Vec<IntegritySignal> {
        risks
            .iter()
            .filter_map(|risk| {
                let (level, weight, escalation_reason) = match (risk.kind, risk.level) {
                    (RiskKind::SuicideIntent, RiskLevel::High) => (
                        IntegrityLevel::Critical,
                        1.0,
                        "High confidence suicide intent detected",
                    ),
                    (RiskKind::SelfHarmIdeation, RiskLevel::Medium) => (
                        IntegrityLevel::High,
                        0.8,
                        "Medium confidence self-harm ideation detected",
                    ),
                    _ => return None,
                };

                Some(
                    IntegritySignal::new(level, risk.kind.as_str())
                        .with_weight(weight)
                        .with_detail(
                            "risk_flag",
                            serde_json::json!({
                                "kind": risk.kind,
                                "level": risk.level,
                                "confidence": risk.confidence,
                                "excerpt": risk.excerpt,
                            }),
                        )
                        .with_detail("escalation_reason", escalation_reason)
                        .with_detail("meta", meta),
                )
            })
            .collect()
    }

    /// Summarize a set of risk flags.
    pub fn summarize(&self, risks: &[RiskFlag]) -> SafetySummary {
        SafetySummary::from_risks(risks)
    }
}

impl Default for SafetyDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Level for a confidence value, per risk kind.
pub fn level_for(kind: RiskKind, confidence: f64) -> RiskLevel {
    match kind {
        RiskKind::SuicideIntent if confidence > 0.3 => RiskLevel::High,
        RiskKind::SuicideIntent if confidence > 0.1 => RiskLevel::Medium,
        RiskKind::SelfHarmIdeation if confidence > 0.2 => RiskLevel::Medium,
        RiskKind::SelfHate if confidence > 0.3 => RiskLevel::Medium,
        RiskKind::SuicideIntent
        | RiskKind::SelfHarmIdeation
        | RiskKind::SelfHate
        | RiskKind::Isolation
        | RiskKind::Hopelessness => RiskLevel::Low,
    }
}

/// Context window around the first occurrence of `term`, at most 160 chars.
pub fn excerpt(text: &str, term: &str, mode: MatchMode) -> String {
    let lower = text.to_lowercase();
    let chars: Vec<char> = text.chars().collect();

    let Some(byte_pos) = mode.find(&lower, &term.to_lowercase()) else {
        return cap_length(chars);
    };

    // Lower-casing can change lengths for a few scripts; clamp to the original.
    let pos = lower[..byte_pos].chars().count().min(chars.len());
    let start = pos.saturating_sub(EXCERPT_CONTEXT);
    let end = (pos + term.chars().count() + EXCERPT_CONTEXT).min(chars.len());

    let mut excerpt: Vec<char> = Vec::with_capacity(end - start + 6);
    if start > 0 {
        excerpt.extend("...".chars());
    }
    excerpt.extend_from_slice(&chars[start..end]);
    if end < chars.len() {
        excerpt.extend("...".chars());
    }

    cap_length(excerpt)
}

fn cap_length(chars: Vec<char>) -> String {
    if chars.len() > MAX_EXCERPT_CHARS {
        let mut capped: String = chars[..MAX_EXCERPT_CHARS - 3].iter().collect();
        capped.push_str("...");
        capped
    } else {
        chars.into_iter().collect()
    }
}

/// Aggregate view over a set of risk flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetySummary {
    /// Highest level present, `None` when there are no risks
    pub overall_risk: Option<RiskLevel>,
    pub total_risks: usize,
    pub by_level: BTreeMap<String, usize>,
    pub by_kind: BTreeMap<String, usize>,
    pub highest_confidence: f64,
}

impl SafetySummary {
    /// Build a summary from risk flags.
    pub fn from_risks(risks: &[RiskFlag]) -> Self {
        let mut by_level = BTreeMap::new();
        let mut by_kind = BTreeMap::new();

        for risk in risks {
            *by_level.entry(risk.level.as_str().to_string()).or_insert(0) += 1;
            *by_kind.entry(risk.kind.as_str().to_string()).or_insert(0) += 1;
        }

        Self {
            overall_risk: risks.iter().map(|r| r.level).max(),
            total_risks: risks.len(),
            by_level,
            by_kind,
            highest_confidence: risks.iter().map(|r| r.confidence).fold(0.0, f64::max),
        }
    }
}
