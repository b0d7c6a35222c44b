//! Window summary over the signal log.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::record::{RecordType, SignalRecord};
use crate::trends::{analyze_downhill, in_window, TrendAlert};

/// Number of emotions listed in a summary.
const TOP_EMOTIONS: usize = 5;

/// Number of recent risks kept as highlights.
const RECENT_RISKS: usize = 10;

/// Reported counts, top emotions and alert for a window of days.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalSummary {
    pub window_days: u32,
    pub from_ts: DateTime<Utc>,
    pub to_ts: DateTime<Utc>,
    /// Record counts per type
    pub counts: BTreeMap<String, usize>,
    /// Mean joy score, 0.0 unless joy is among the top emotions
    pub joy_avg: f64,
    /// `(emotion, mean score)`, highest first
    pub top_emotions: Vec<(String, f64)>,
    /// Risk counts keyed `kind:level`
    pub risk_breakdown: BTreeMap<String, usize>,
    pub highlights: Highlights,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<TrendAlert>,
}

/// Notable entries in the window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Highlights {
    /// First risks seen in the window, in log order
    pub recent_risks: Vec<RiskHighlight>,
    /// Number of future-tense negation signals
    pub incongruence: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskHighlight {
    pub timestamp: DateTime<Utc>,
    pub kind: String,
    pub level: String,
    pub confidence: f64,
}

impl SignalSummary {
    /// Summarize the records within `window_days` before `now`.
    pub fn build(records: &[SignalRecord], window_days: u32, now: DateTime<Utc>) -> Self {
        let recent = in_window(records, window_days, now);

        let mut counts: BTreeMap<String, usize> = [
            RecordType::Emotions,
            RecordType::Risks,
            RecordType::Integrity,
        ]
        .iter()
        .map(|kind| (kind.as_str().to_string(), 0))
        .collect();
        let mut emotion_scores: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        let mut risk_breakdown = BTreeMap::new();
        let mut highlights = Highlights::default();

        for record in &recent {
            *counts.entry(record.kind.as_str().to_string()).or_insert(0) += 1;

            match record.kind {
                RecordType::Emotions => {
                    for entry in &record.data {
                        let name = str_field(entry, "name", "?");
                        let score = entry.get("score").and_then(Value::as_f64).unwrap_or(0.0);
                        emotion_scores.entry(name).or_default().push(score);
                    }
                }
                RecordType::Risks => {
                    for entry in &record.data {
                        let kind = str_field(entry, "kind", "?");
                        let level = str_field(entry, "level", "low");
                        *risk_breakdown
                            .entry(format!("{}:{}", kind, level))
                            .or_insert(0) += 1;

                        if highlights.recent_risks.len() < RECENT_RISKS {
                            highlights.recent_risks.push(RiskHighlight {
                                timestamp: record.timestamp,
                                kind,
                                level,
                                confidence: entry
                                    .get("confidence")
                                    .and_then(Value::as_f64)
                                    .unwrap_or(0.0),
                            });
                        }
                    }
                }
                RecordType::Integrity => {
                    highlights.incongruence += record
                        .data
                        .iter()
                        .filter(|entry| is_future_tense_negation(entry))
                        .count();
                }
            }
        }

        let mut top_emotions: Vec<(String, f64)> = emotion_scores
            .into_iter()
            .filter(|(_, scores)| !scores.is_empty())
            .map(|(name, scores)| {
                let mean = scores.iter().sum::<f64>() / scores.len() as f64;
                (name, mean)
            })
            .collect();
        top_emotions.sort_by(|a, b| b.1.total_cmp(&a.1));
        top_emotions.truncate(TOP_EMOTIONS);

        let joy_avg = top_emotions
            .iter()
            .find(|(name, _)| name == "joy")
            .map_or(0.0, |(_, mean)| *mean);

        let alert = analyze_downhill(records, window_days, now).into_alert();

        Self {
            window_days,
            from_ts: now - Duration::days(i64::from(window_days)),
            to_ts: now,
            counts,
            joy_avg,
            top_emotions,
            risk_breakdown,
            highlights,
            alert,
        }
    }
}

fn str_field(entry: &Value, key: &str, default: &str) -> String {
    entry
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

fn is_future_tense_negation(entry: &Value) -> bool {
    entry
        .get("details")
        .and_then(|details| details.get("pattern"))
        .and_then(Value::as_str)
        == Some("future_tense_negation")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        "2024-06-10T12:00:00Z".parse().unwrap()
    }

    fn record(kind: RecordType, days_ago: i64, data: Vec<Value>) -> SignalRecord {
        SignalRecord::new(kind, "s", now() - Duration::days(days_ago), data)
    }

    #[test]
    fn test_empty_summary() {
        let summary = SignalSummary::build(&[], 7, now());

        assert_eq!(summary.counts.get("emotions"), Some(&0));
        assert_eq!(summary.counts.get("risks"), Some(&0));
        assert_eq!(summary.counts.get("integrity"), Some(&0));
        assert_eq!(summary.joy_avg, 0.0);
        assert!(summary.top_emotions.is_empty());
        assert!(summary.alert.is_none());
        assert_eq!(summary.to_ts - summary.from_ts, Duration::days(7));
    }

    #[test]
    fn test_summary_aggregates() {
        let records = vec![
            record(
                RecordType::Emotions,
                1,
                vec![
                    json!({"name": "joy", "score": 0.4}),
                    json!({"name": "fear", "score": 0.1}),
                ],
            ),
            record(RecordType::Emotions, 2, vec![json!({"name": "joy", "score": 0.2})]),
            record(
                RecordType::Risks,
                1,
                vec![
                    json!({"kind": "isolation", "level": "low", "confidence": 0.5}),
                    json!({"kind": "isolation", "level": "low", "confidence": 0.2}),
                ],
            ),
            record(
                RecordType::Integrity,
                1,
                vec![
                    json!({"level": "low", "reason": "Future-tense promise with negation detected",
                           "weight": 0.3, "details": {"pattern": "future_tense_negation"}}),
                    json!({"level": "critical", "reason": "suicide-intent", "weight": 1.0, "details": {}}),
                ],
            ),
            // Outside the window
            record(RecordType::Emotions, 30, vec![json!({"name": "anger", "score": 1.0})]),
        ];

        let summary = SignalSummary::build(&records, 7, now());

        assert_eq!(summary.counts.get("emotions"), Some(&2));
        assert_eq!(summary.counts.get("risks"), Some(&1));
        assert_eq!(summary.top_emotions[0].0, "joy");
        assert!((summary.joy_avg - 0.3).abs() < 1e-12);
        assert!(summary.top_emotions.iter().all(|(name, _)| name != "anger"));
        assert_eq!(summary.risk_breakdown.get("isolation:low"), Some(&2));
        assert_eq!(summary.highlights.recent_risks.len(), 2);
        assert_eq!(summary.highlights.incongruence, 1);
    }

    #[test]
    fn test_top_emotions_capped() {
        let data: Vec<Value> = ["joy", "sadness", "anger", "fear", "trust", "love"]
            .iter()
            .enumerate()
            .map(|(i, name)| json!({"name": name, "score": 0.9 - i as f64 * 0.1}))
            .collect();
        let records = vec![record(RecordType::Emotions, 1, data)];
        let summary = SignalSummary::build(&records, 7, now());

        assert_eq!(summary.top_emotions.len(), 5);
        assert!(summary.top_emotions.iter().all(|(name, _)| name != "love"));
    }
}
