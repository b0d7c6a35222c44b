//! LUMIRA detectors.
//!
//! Rule-based detectors that read a [`TextSample`](lumira_core::TextSample)
//! and produce findings:
//!
//! - **Emotion scoring**: lexicon term counts normalized by word count
//! - **Incongruence**: future-tense negation, conflicting emotions, claims
//! - **Safety**: risk categories, escalation patterns, excerpts
//!
//! # Pipeline
//!
//! ```text
//! TextSample ──┬── EmotionScorer ──────── EmotionScore[] ──┐
//!              ├── IncongruenceDetector ─ IntegritySignal[]├── AnalysisReport
//!              └── SafetyDetector ─────── RiskFlag[] ──────┘
//!                        │
//!                        └── escalate ─── IntegritySignal[]
//! ```
//!
//! Detectors hold only immutable lexicons and patterns and never fail on text.

pub mod emotion;
pub mod features;
pub mod incongruence;
pub mod safety;

// Re-export main types
pub use emotion::EmotionScorer;
pub use features::{featurize, TextFeatures};
pub use incongruence::{Contradiction, IncongruenceDetector, FUTURE_TENSE_NEGATION};
pub use safety::{SafetyDetector, SafetySummary};
