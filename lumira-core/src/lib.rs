//! Core data model for the LUMIRA text signal engine.
//!
//! - [`TextSample`]: input text with id, timestamp, source and metadata
//! - [`EmotionScore`], [`RiskFlag`], [`IntegritySignal`]: per-sample findings
//! - [`AnalysisReport`]: everything found for one sample
//! - [`LexiconTable`] / [`RiskLexicon`]: term lists injected into detectors
//! - [`PatternSet`]: compiled regex rules for incongruence and escalation
//!
//! Nothing in this crate performs I/O.

pub mod lexicon;
pub mod patterns;
pub mod timestamp;
pub mod types;

// Re-export main types
pub use lexicon::{LexiconEntry, LexiconTable, MatchMode, RiskLexicon, RiskTerms};
pub use patterns::PatternSet;
pub use types::*;
