//! LUMIRA - layered text signal analysis
//!
//! Ingests short text samples and produces:
//!
//! - **Emotion scores**: lexicon-driven, normalized by length
//! - **Safety risk flags**: rule-based, with bounded excerpts and escalation
//! - **Integrity signals**: incongruence between intent and language
//! - **Trend alerts**: "downhill" patterns over the append-only signal log
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────── LumiraEngine ────────────────────────────┐
//! │                                                                      │
//! │  TextSample ─┬─ EmotionScorer ─────────┐                             │
//! │              ├─ IncongruenceDetector ──┼─ AnalysisReport             │
//! │              └─ SafetyDetector ────────┘        │                    │
//! │                                                 ▼                    │
//! │                                   SignalStore (JSONL, append-only)   │
//! │                                                 │                    │
//! │                                                 ▼                    │
//! │                                   Trend analysis ── TrendSummary     │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The detectors are non-clinical heuristics and must not be used for
//! diagnosis.

pub mod config;
pub mod engine;

// Re-export main types
pub use config::{FeatureFlags, LumiraConfig};
pub use engine::{EngineComponents, EngineError, LumiraEngine, ModuleStatus, Result};
