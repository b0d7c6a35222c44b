//! Signal log records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use lumira_core::{EmotionScore, IntegritySignal, RiskFlag};

/// Kind of payload carried by a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Emotions,
    Risks,
    Integrity,
}

impl RecordType {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Emotions => "emotions",
            RecordType::Risks => "risks",
            RecordType::Integrity => "integrity",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the signal log.
///
/// Payloads are kept as raw JSON so that records written by other
/// producers (or older versions) still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    /// Payload kind
    #[serde(rename = "type")]
    pub kind: RecordType,
    /// Sample the payload was computed from
    pub sample_id: String,
    /// Sample timestamp
    #[serde(deserialize_with = "lumira_core::timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    /// Payload entries
    pub data: Vec<Value>,
}

impl SignalRecord {
    /// Create a record from already-serialized payload entries.
    pub fn new(
        kind: RecordType,
        sample_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        data: Vec<Value>,
    ) -> Self {
        Self {
            kind,
            sample_id: sample_id.into(),
            timestamp,
            data,
        }
    }

    /// Create an `emotions` record.
    pub fn emotions(
        sample_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        emotions: &[EmotionScore],
    ) -> serde_json::Result<Self> {
        Ok(Self::new(
            RecordType::Emotions,
            sample_id,
            timestamp,
            to_values(emotions)?,
        ))
    }

    /// Create a `risks` record.
    pub fn risks(
        sample_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        risks: &[RiskFlag],
    ) -> serde_json::Result<Self> {
        Ok(Self::new(
            RecordType::Risks,
            sample_id,
            timestamp,
            to_values(risks)?,
        ))
    }

    /// Create an `integrity` record.
    pub fn integrity(
        sample_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        signals: &[IntegritySignal],
    ) -> serde_json::Result<Self> {
        Ok(Self::new(
            RecordType::Integrity,
            sample_id,
            timestamp,
            to_values(signals)?,
        ))
    }

    /// Convert to a JSONL line (without the trailing newline).
    pub fn to_jsonl(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn to_values<T: Serialize>(items: &[T]) -> serde_json::Result<Vec<Value>> {
    items.iter().map(serde_json::to_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumira_core::{Emotion, IntegrityLevel};

    #[test]
    fn test_record_wire_format() {
        let ts = "2024-03-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let record =
            SignalRecord::emotions("s-1", ts, &[EmotionScore::new(Emotion::Joy, 0.5)]).unwrap();
        let value: Value = serde_json::from_str(&record.to_jsonl().unwrap()).unwrap();

        assert_eq!(value["type"], "emotions");
        assert_eq!(value["sample_id"], "s-1");
        assert_eq!(value["data"][0]["name"], "joy");
        assert_eq!(value["data"][0]["score"], 0.5);
        assert!(value["timestamp"].as_str().unwrap().starts_with("2024-03-01T12:00:00"));
    }

    #[test]
    fn test_integrity_payload() {
        let signal = IntegritySignal::new(IntegrityLevel::High, "self-harm-ideation").with_weight(0.8);
        let record = SignalRecord::integrity("s-2", Utc::now(), &[signal]).unwrap();

        assert_eq!(record.kind, RecordType::Integrity);
        assert_eq!(record.data[0]["level"], "high");
        assert_eq!(record.data[0]["weight"], 0.8);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let line = r#"{"type":"metrics","sample_id":"x","timestamp":"2024-03-01T12:00:00Z","data":[]}"#;
        assert!(serde_json::from_str::<SignalRecord>(line).is_err());
    }

    #[test]
    fn test_offset_timestamp_normalized_to_utc() {
        let line = r#"{"type":"risks","sample_id":"x","timestamp":"2024-03-01T23:30:00-02:00","data":[]}"#;
        let record: SignalRecord = serde_json::from_str(line).unwrap();
        assert_eq!(record.timestamp.to_rfc3339(), "2024-03-02T01:30:00+00:00");
    }

    #[test]
    fn test_naive_timestamp_read_as_utc() {
        let line = r#"{"type":"risks","sample_id":"x","timestamp":"2024-03-01T12:00:00.123456","data":[{"kind":"isolation","level":"low","confidence":0.5,"excerpt":"alone","ts":"2024-03-01T12:00:00.123456"}]}"#;
        let record: SignalRecord = serde_json::from_str(line).unwrap();
        assert_eq!(
            record.timestamp.to_rfc3339(),
            "2024-03-01T12:00:00.123456+00:00"
        );

        let flag: RiskFlag = serde_json::from_value(record.data[0].clone()).unwrap();
        assert_eq!(flag.timestamp, record.timestamp);
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        let line = r#"{"type":"risks","sample_id":"x","timestamp":"yesterday","data":[]}"#;
        assert!(serde_json::from_str::<SignalRecord>(line).is_err());
    }
}
