//! Core types for the LUMIRA signal engine.
//!
//! These types are shared by the detectors, the signal log and the engine.
//! Serialized field names match the JSONL record payloads.
//!
//! With the `typescript` feature enabled, these types can be exported to TypeScript
//! using ts-rs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Free-form metadata attached to samples and signals.
pub type Meta = serde_json::Map<String, serde_json::Value>;

/// A text sample submitted for analysis.
///
/// Detectors only ever borrow a sample; it is never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct TextSample {
    /// Caller-unique identifier
    pub id: String,
    /// When the text was produced
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    /// Where the text came from (journal, chat, import...)
    pub source: String,
    /// The raw text
    pub text: String,
    /// Caller metadata, forwarded into escalation details
    #[serde(default)]
    pub meta: Meta,
}

impl TextSample {
    /// Create a sample with a generated id and the current time.
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            source: source.into(),
            text: text.into(),
            meta: Meta::new(),
        }
    }

    /// Set the sample id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the sample timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Add a metadata entry.
    pub fn with_meta(mut self, key: &str, value: impl Serialize) -> Self {
        self.meta.insert(
            key.to_string(),
            serde_json::to_value(value).unwrap_or_default(),
        );
        self
    }

    /// Whitespace-separated token count of the original text.
    pub fn word_count(&self) -> usize {
        word_count(&self.text)
    }
}

/// Whitespace-separated token count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// The fixed emotion set scored by the lexicon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Joy,
    Sadness,
    Anger,
    Fear,
    Surprise,
    Disgust,
    Trust,
    Anticipation,
    Shame,
    Pride,
    Love,
    Contempt,
}

impl Emotion {
    /// All emotions in lexicon order.
    pub const ALL: [Emotion; 12] = [
        Emotion::Joy,
        Emotion::Sadness,
        Emotion::Anger,
        Emotion::Fear,
        Emotion::Surprise,
        Emotion::Disgust,
        Emotion::Trust,
        Emotion::Anticipation,
        Emotion::Shame,
        Emotion::Pride,
        Emotion::Love,
        Emotion::Contempt,
    ];

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Joy => "joy",
            Emotion::Sadness => "sadness",
            Emotion::Anger => "anger",
            Emotion::Fear => "fear",
            Emotion::Surprise => "surprise",
            Emotion::Disgust => "disgust",
            Emotion::Trust => "trust",
            Emotion::Anticipation => "anticipation",
            Emotion::Shame => "shame",
            Emotion::Pride => "pride",
            Emotion::Love => "love",
            Emotion::Contempt => "contempt",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score for a single emotion (0.0 - 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct EmotionScore {
    /// Emotion category
    pub name: Emotion,
    /// Normalized score
    pub score: f64,
}

impl EmotionScore {
    pub fn new(name: Emotion, score: f64) -> Self {
        Self { name, score }
    }
}

/// Kind of safety risk.
///
/// Each kind is backed by one category of the risk lexicon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "kebab-case")]
pub enum RiskKind {
    /// Self-harm ideation (category `self_harm_general`)
    SelfHarmIdeation,
    /// Suicidal intent
    SuicideIntent,
    /// Self-directed hate or worthlessness
    SelfHate,
    /// Loneliness and abandonment
    Isolation,
    /// Hopelessness and numbness
    Hopelessness,
}

impl RiskKind {
    /// All kinds in detection order.
    pub const ALL: [RiskKind; 5] = [
        RiskKind::SelfHarmIdeation,
        RiskKind::SuicideIntent,
        RiskKind::SelfHate,
        RiskKind::Isolation,
        RiskKind::Hopelessness,
    ];

    /// Serialized kind string.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskKind::SelfHarmIdeation => "self-harm-ideation",
            RiskKind::SuicideIntent => "suicide-intent",
            RiskKind::SelfHate => "self-hate",
            RiskKind::Isolation => "isolation",
            RiskKind::Hopelessness => "hopelessness",
        }
    }

    /// Lexicon category name.
    pub fn category(&self) -> &'static str {
        match self {
            RiskKind::SelfHarmIdeation => "self_harm_general",
            RiskKind::SuicideIntent => "suicide_intent",
            RiskKind::SelfHate => "self_hate",
            RiskKind::Isolation => "isolation",
            RiskKind::Hopelessness => "hopelessness",
        }
    }
}

impl fmt::Display for RiskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Level assigned to a risk flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    /// Weight used when aggregating risk over time.
    pub fn weight(&self) -> f64 {
        match self {
            RiskLevel::Low => 0.3,
            RiskLevel::Medium => 0.6,
            RiskLevel::High => 0.9,
        }
    }

    /// Parse a serialized level.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(RiskLevel::Low),
            "medium" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A safety risk found in a sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct RiskFlag {
    /// Risk kind
    pub kind: RiskKind,
    /// Assigned level
    pub level: RiskLevel,
    /// Confidence (0.0 - 1.0)
    pub confidence: f64,
    /// Context around the first matched term (at most 160 chars)
    pub excerpt: String,
    /// Timestamp of the analyzed sample
    #[serde(rename = "ts", deserialize_with = "crate::timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
}

/// Level of an integrity signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum IntegrityLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl IntegrityLevel {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrityLevel::Low => "low",
            IntegrityLevel::Medium => "medium",
            IntegrityLevel::High => "high",
            IntegrityLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for IntegrityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_weight() -> f64 {
    1.0
}

/// An integrity signal produced by incongruence detection or safety escalation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct IntegritySignal {
    /// Signal level
    pub level: IntegrityLevel,
    /// Human readable reason
    pub reason: String,
    /// Signal weight
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Structured details
    #[serde(default)]
    pub details: Meta,
}

impl IntegritySignal {
    /// Create a signal with the default weight of 1.0.
    pub fn new(level: IntegrityLevel, reason: impl Into<String>) -> Self {
        Self {
            level,
            reason: reason.into(),
            weight: default_weight(),
            details: Meta::new(),
        }
    }

    /// Set the weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Add a detail entry.
    pub fn with_detail(mut self, key: &str, value: impl Serialize) -> Self {
        self.details.insert(
            key.to_string(),
            serde_json::to_value(value).unwrap_or_default(),
        );
        self
    }
}

/// Two opposing emotions that both scored above the conflict threshold.
///
/// This is a diagnostic; it only becomes an [`IntegritySignal`] when a
/// caller promotes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct EmotionConflict {
    pub positive: Emotion,
    pub negative: Emotion,
    pub positive_score: f64,
    pub negative_score: f64,
}

impl EmotionConflict {
    /// Indicator tag, e.g. `conflicting_emotions_joy_sadness`.
    pub fn indicator(&self) -> String {
        format!("conflicting_emotions_{}_{}", self.positive, self.negative)
    }

    /// Promote the conflict to a low-level integrity signal.
    pub fn to_signal(&self) -> IntegritySignal {
        IntegritySignal::new(
            IntegrityLevel::Low,
            format!(
                "Conflicting emotions detected: {}/{}",
                self.positive, self.negative
            ),
        )
        .with_weight(0.5)
        .with_detail("pattern", self.indicator())
        .with_detail(self.positive.as_str(), self.positive_score)
        .with_detail(self.negative.as_str(), self.negative_score)
    }
}

/// Complete analysis of one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct AnalysisReport {
    /// Analyzed sample id
    pub sample_id: String,
    /// Emotion scores, highest first
    pub emotions: Vec<EmotionScore>,
    /// Integrity signals (incongruence first, then escalations)
    pub integrity: Vec<IntegritySignal>,
    /// Risk flags, highest confidence first
    pub risks: Vec<RiskFlag>,
    /// Conflicting-emotion diagnostics
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<EmotionConflict>,
}

impl AnalysisReport {
    /// Create an empty report for a sample.
    pub fn empty(sample_id: impl Into<String>) -> Self {
        Self {
            sample_id: sample_id.into(),
            emotions: vec![],
            integrity: vec![],
            risks: vec![],
            conflicts: vec![],
        }
    }

    /// Highest scoring emotion, if any.
    pub fn top_emotion(&self) -> Option<&EmotionScore> {
        self.emotions.first()
    }

    /// Highest risk level across all flags.
    pub fn highest_risk_level(&self) -> Option<RiskLevel> {
        self.risks.iter().map(|r| r.level).max()
    }

    /// Highest integrity level across all signals.
    pub fn highest_integrity_level(&self) -> Option<IntegrityLevel> {
        self.integrity.iter().map(|s| s.level).max()
    }

    /// Whether nothing was found.
    pub fn is_empty(&self) -> bool {
        self.emotions.is_empty() && self.integrity.is_empty() && self.risks.is_empty()
    }
}

/// Error types for lexicon and pattern construction.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A pattern failed to compile
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Lexicon YAML could not be parsed
    #[error("Lexicon format error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Lexicon content is invalid
    #[error("Lexicon error: {0}")]
    Lexicon(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_builder() {
        let sample = TextSample::new("journal", "hello  there\nfriend")
            .with_id("s-1")
            .with_meta("user", "u-7");

        assert_eq!(sample.id, "s-1");
        assert_eq!(sample.word_count(), 3);
        assert_eq!(sample.meta.get("user").and_then(|v| v.as_str()), Some("u-7"));
    }

    #[test]
    fn test_empty_text_has_no_words() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   \t\n"), 0);
    }

    #[test]
    fn test_risk_flag_wire_format() {
        let flag = RiskFlag {
            kind: RiskKind::SuicideIntent,
            level: RiskLevel::High,
            confidence: 0.5,
            excerpt: "excerpt".to_string(),
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&flag).unwrap();

        assert_eq!(value["kind"], "suicide-intent");
        assert_eq!(value["level"], "high");
        assert!(value.get("ts").is_some());
        assert!(value.get("timestamp").is_none());
    }

    #[test]
    fn test_integrity_signal_default_weight() {
        let signal: IntegritySignal =
            serde_json::from_str(r#"{"level": "critical", "reason": "x"}"#).unwrap();
        assert_eq!(signal.weight, 1.0);
        assert!(signal.details.is_empty());
        assert_eq!(signal.level, IntegrityLevel::Critical);
    }

    #[test]
    fn test_level_ordering() {
        assert!(RiskLevel::High > RiskLevel::Medium);
        assert!(IntegrityLevel::Critical > IntegrityLevel::High);
        assert_eq!(RiskLevel::parse("medium"), Some(RiskLevel::Medium));
        assert_eq!(RiskLevel::parse("severe"), None);
    }

    #[test]
    fn test_conflict_promotion() {
        let conflict = EmotionConflict {
            positive: Emotion::Joy,
            negative: Emotion::Sadness,
            positive_score: 0.5,
            negative_score: 0.4,
        };
        let signal = conflict.to_signal();

        assert_eq!(conflict.indicator(), "conflicting_emotions_joy_sadness");
        assert_eq!(signal.level, IntegrityLevel::Low);
        assert_eq!(signal.weight, 0.5);
        assert!(signal.reason.contains("joy/sadness"));
    }

    #[test]
    fn test_report_helpers() {
        let mut report = AnalysisReport::empty("s-1");
        assert!(report.is_empty());
        assert!(report.highest_risk_level().is_none());

        report.emotions.push(EmotionScore::new(Emotion::Joy, 0.25));
        assert_eq!(report.top_emotion().map(|e| e.name), Some(Emotion::Joy));
    }
}
