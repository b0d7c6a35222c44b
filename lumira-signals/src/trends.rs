//! Trend analysis over the signal log.
//!
//! Detects "downhill" patterns: joy decreasing while weighted risk increases
//! over a window of days. The heuristic:
//!
//! 1. Keep records inside the window
//! 2. Build one joy value and one risk value per observed UTC day, requiring
//!    at least three days in each series
//! 3. Smooth both series with a trailing 3-day moving average
//! 4. Fit a least-squares slope to each smoothed series
//! 5. Alert when joy falls faster than 0.1/day and risk rises faster than 0.1/day

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use lumira_core::{Emotion, RiskLevel};

use crate::record::{RecordType, SignalRecord};

/// Default analysis window.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Moving average window, in days.
const SMOOTHING_WINDOW: usize = 3;

/// Slope magnitude that counts as a trend.
const TREND_THRESHOLD: f64 = 0.1;

/// Minimum records in the window for downhill analysis.
const MIN_RECORDS: usize = 3;

/// Minimum observed days in each daily series for downhill analysis.
const MIN_DAYS: usize = 3;

/// Weight for risk entries with a missing or unknown level.
const UNKNOWN_LEVEL_WEIGHT: f64 = 0.3;

/// Trailing moving average. Index `i` averages the last `min(window, i + 1)` values.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return vec![];
    }

    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Least-squares slope of `values` against `x = 0..n`.
///
/// Returns 0.0 for fewer than two points.
pub fn linear_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = values.iter().sum::<f64>() / n as f64;

    let (numerator, denominator) = values.iter().enumerate().fold(
        (0.0, 0.0),
        |(num, den), (i, y)| {
            let dx = i as f64 - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        },
    );

    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Records inside `[now - window_days, ..]`.
pub fn in_window(records: &[SignalRecord], window_days: u32, now: DateTime<Utc>) -> Vec<&SignalRecord> {
    let cutoff = now - Duration::days(i64::from(window_days));
    records.iter().filter(|r| r.timestamp >= cutoff).collect()
}

/// Per-day averages of `value_of` over the entries of records of `kind`.
///
/// Every day with at least one matching record appears; a day whose records
/// contributed no values averages to 0.0.
fn daily_average<'a, I, F>(records: I, kind: RecordType, mut value_of: F) -> Vec<f64>
where
    I: IntoIterator<Item = &'a SignalRecord>,
    F: FnMut(&Value) -> Option<f64>,
{
    let mut days: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();

    for record in records.into_iter().filter(|r| r.kind == kind) {
        let values = days.entry(record.timestamp.date_naive()).or_default();
        values.extend(record.data.iter().filter_map(&mut value_of));
    }

    days.into_values()
        .map(|values| {
            if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            }
        })
        .collect()
}

/// Daily mean score of one emotion.
pub fn daily_emotion_average<'a, I>(records: I, emotion: Emotion) -> Vec<f64>
where
    I: IntoIterator<Item = &'a SignalRecord>,
{
    daily_average(records, RecordType::Emotions, |entry| {
        (entry.get("name").and_then(Value::as_str) == Some(emotion.as_str()))
            .then(|| entry.get("score").and_then(Value::as_f64).unwrap_or(0.0))
    })
}

/// Daily mean of `confidence * level weight` over risk entries.
pub fn daily_risk_average<'a, I>(records: I) -> Vec<f64>
where
    I: IntoIterator<Item = &'a SignalRecord>,
{
    daily_average(records, RecordType::Risks, |entry| {
        let confidence = entry.get("confidence").and_then(Value::as_f64).unwrap_or(0.0);
        let weight = entry
            .get("level")
            .and_then(Value::as_str)
            .and_then(RiskLevel::parse)
            .map_or(UNKNOWN_LEVEL_WEIGHT, |level| level.weight());
        Some(confidence * weight)
    })
}

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

impl AlertSeverity {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected downhill trend. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAlert {
    pub reason: String,
    pub severity: AlertSeverity,
    pub window_days: u32,
    /// Slope of the smoothed joy series
    pub joy_trend: f64,
    /// Slope of the smoothed risk series
    pub risk_trend: f64,
    pub joy_moving_avg: Vec<f64>,
    pub risk_moving_avg: Vec<f64>,
    pub detected_at: DateTime<Utc>,
}

/// Result of a downhill analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum TrendOutcome {
    /// Not enough records or days to fit a trend
    InsufficientData,
    /// Trends computed, thresholds not crossed
    NoTrend { joy_trend: f64, risk_trend: f64 },
    /// Downhill pattern detected
    Alert(TrendAlert),
}

impl TrendOutcome {
    /// The alert, if one was raised.
    pub fn into_alert(self) -> Option<TrendAlert> {
        match self {
            TrendOutcome::Alert(alert) => Some(alert),
            TrendOutcome::InsufficientData | TrendOutcome::NoTrend { .. } => None,
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, TrendOutcome::Alert(_))
    }
}

/// Analyze records for a downhill trend within `window_days` before `now`.
pub fn analyze_downhill(records: &[SignalRecord], window_days: u32, now: DateTime<Utc>) -> TrendOutcome {
    let recent = in_window(records, window_days, now);

    let has_kind = |kind: RecordType| recent.iter().any(|r| r.kind == kind);
    if recent.len() < MIN_RECORDS || !has_kind(RecordType::Emotions) || !has_kind(RecordType::Risks) {
        debug!(
            records = recent.len(),
            window_days = window_days,
            "Insufficient records for trend analysis"
        );
        return TrendOutcome::InsufficientData;
    }

    let daily_joy = daily_emotion_average(recent.iter().copied(), Emotion::Joy);
    let daily_risk = daily_risk_average(recent.iter().copied());

    if daily_joy.len() < MIN_DAYS || daily_risk.len() < MIN_DAYS {
        debug!(
            joy_days = daily_joy.len(),
            risk_days = daily_risk.len(),
            "Insufficient days for trend analysis"
        );
        return TrendOutcome::InsufficientData;
    }

    let joy_moving_avg = moving_average(&daily_joy, SMOOTHING_WINDOW);
    let risk_moving_avg = moving_average(&daily_risk, SMOOTHING_WINDOW);

    let joy_trend = linear_slope(&joy_moving_avg);
    let risk_trend = linear_slope(&risk_moving_avg);

    debug!(
        joy_trend = joy_trend,
        risk_trend = risk_trend,
        window_days = window_days,
        "Trend slopes computed"
    );

    if joy_trend < -TREND_THRESHOLD && risk_trend > TREND_THRESHOLD {
        TrendOutcome::Alert(TrendAlert {
            reason: "Joy decreasing and risk increasing over time".to_string(),
            severity: AlertSeverity::Medium,
            window_days,
            joy_trend,
            risk_trend,
            joy_moving_avg,
            risk_moving_avg,
            detected_at: now,
        })
    } else {
        TrendOutcome::NoTrend {
            joy_trend,
            risk_trend,
        }
    }
}

/// Downhill alert over the last `window_days`, if any.
pub fn downhill_alert(records: &[SignalRecord], window_days: u32) -> Option<TrendAlert> {
    analyze_downhill(records, window_days, Utc::now()).into_alert()
}

/// Direction of a single-emotion trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
    NoData,
    InsufficientData,
}

/// Trend of one emotion over raw daily means.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionTrend {
    pub emotion: Emotion,
    pub direction: TrendDirection,
    pub slope: f64,
    /// Daily means, oldest first
    pub values: Vec<f64>,
    pub window_days: u32,
}

/// Trend of one emotion within `window_days` before `now`.
pub fn emotion_trend(
    records: &[SignalRecord],
    emotion: Emotion,
    window_days: u32,
    now: DateTime<Utc>,
) -> EmotionTrend {
    let recent = in_window(records, window_days, now);
    let trend = |direction, slope, values| EmotionTrend {
        emotion,
        direction,
        slope,
        values,
        window_days,
    };

    if !recent.iter().any(|r| r.kind == RecordType::Emotions) {
        return trend(TrendDirection::NoData, 0.0, vec![]);
    }

    let values = daily_emotion_average(recent.iter().copied(), emotion);
    if values.len() < 2 {
        return trend(TrendDirection::InsufficientData, 0.0, values);
    }

    let slope = linear_slope(&values);
    let direction = if slope > TREND_THRESHOLD {
        TrendDirection::Increasing
    } else if slope < -TREND_THRESHOLD {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };

    trend(direction, slope, values)
}

/// Counts of risk entries by level and kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiskSummary {
    pub total_risks: usize,
    pub by_level: BTreeMap<String, usize>,
    pub by_kind: BTreeMap<String, usize>,
}

/// Summarize risk entries across `risks` records.
pub fn risk_summary(records: &[SignalRecord]) -> RiskSummary {
    let mut summary = RiskSummary::default();

    let entries = records
        .iter()
        .filter(|r| r.kind == RecordType::Risks)
        .flat_map(|r| r.data.iter());

    for entry in entries {
        let field = |key: &str| {
            entry
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string()
        };
        summary.total_risks += 1;
        *summary.by_level.entry(field("level")).or_insert(0) += 1;
        *summary.by_kind.entry(field("kind")).or_insert(0) += 1;
    }

    summary
}

/// Result of a window analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub alert_detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<TrendAlert>,
    pub window_days: u32,
    /// Records inside the window
    pub total_records: usize,
}

impl TrendSummary {
    /// Summarize `records` (already limited to the window).
    pub fn from_records(records: &[SignalRecord], window_days: u32, now: DateTime<Utc>) -> Self {
        let alert = analyze_downhill(records, window_days, now).into_alert();
        Self {
            alert_detected: alert.is_some(),
            alert,
            window_days,
            total_records: records.len(),
        }
    }
}
