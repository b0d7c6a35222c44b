//! LUMIRA signal log and trend analytics.
//!
//! - **Records**: one JSON line per (sample, payload type)
//! - **Store**: append-only JSONL file, tolerant of corrupt lines
//! - **Trends**: daily aggregates, moving averages and downhill alerts
//! - **Summary**: counts, top emotions and highlights for a window of days

pub mod record;
pub mod store;
pub mod summary;
pub mod trends;

// Re-export main types
pub use record::{RecordType, SignalRecord};
pub use store::{DateRange, SignalStore, StoreError, StoreStats};
pub use summary::{Highlights, RiskHighlight, SignalSummary};
pub use trends::{
    analyze_downhill, downhill_alert, emotion_trend, linear_slope, moving_average, risk_summary,
    AlertSeverity, EmotionTrend, RiskSummary, TrendAlert, TrendDirection, TrendOutcome,
    TrendSummary, DEFAULT_WINDOW_DAYS,
};
