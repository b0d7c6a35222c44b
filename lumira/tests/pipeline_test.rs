//! End-to-end pipeline tests
//!
//! Exercises the engine against a real signal log:
//! - Sample analysis with all modules enabled
//! - Record persistence and corrupt-line tolerance
//! - Trend alerts over several days of stored signals

use chrono::{Duration, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use tempfile::TempDir;

use lumira::{FeatureFlags, LumiraConfig, LumiraEngine};
use lumira_core::{Emotion, IntegrityLevel, RiskKind, RiskLevel, TextSample};
use lumira_signals::{analyze_downhill, RecordType, SignalRecord, SignalStore, TrendOutcome};

fn engine_at(dir: &TempDir) -> LumiraEngine {
    let config = LumiraConfig::with_flags(FeatureFlags::all())
        .with_db_path(dir.path().join("data").join("signals.jsonl"));
    LumiraEngine::new(config).expect("engine should build")
}

// =============================================================================
// Sample analysis
// =============================================================================

#[test]
fn test_positive_sample() {
    let dir = TempDir::new().unwrap();
    let engine = engine_at(&dir);

    let report = engine.process_sample(&TextSample::new("chat", "I'm so excited about the new project!"));

    assert_eq!(report.top_emotion().map(|e| e.name), Some(Emotion::Joy));
    assert!(report.emotions.iter().all(|e| e.score > 0.0 && e.score <= 1.0));
    assert!(report.risks.is_empty());
    assert!(report.integrity.is_empty());
}

#[test]
fn test_suicide_intent_escalates_to_critical() {
    let dir = TempDir::new().unwrap();
    let engine = engine_at(&dir);
    let sample = TextSample::new("journal", "I want to die. This is my goodbye.")
        .with_meta("user", "u-42");

    let report = engine.process_sample(&sample);

    let suicide = report
        .risks
        .iter()
        .find(|r| r.kind == RiskKind::SuicideIntent)
        .expect("suicide intent flagged");
    assert_eq!(suicide.level, RiskLevel::High);
    assert!(suicide.excerpt.to_lowercase().contains("want to die"));

    let critical = report
        .integrity
        .iter()
        .find(|s| s.level == IntegrityLevel::Critical)
        .expect("critical escalation");
    assert_eq!(critical.reason, "suicide-intent");
    assert_eq!(critical.weight, 1.0);
    assert_eq!(critical.details["meta"]["user"], "u-42");
    assert_eq!(report.highest_integrity_level(), Some(IntegrityLevel::Critical));
}

#[test]
fn test_empty_text() {
    let dir = TempDir::new().unwrap();
    let engine = engine_at(&dir);

    let report = engine.process_sample(&TextSample::new("chat", ""));
    assert!(report.is_empty());

    // Nothing to persist
    assert!(engine.store().unwrap().load().unwrap().is_empty());
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_records_survive_corrupt_lines() {
    let dir = TempDir::new().unwrap();
    let engine = engine_at(&dir);
    let store = engine.store().unwrap();

    engine.process_sample(&TextSample::new("chat", "I am so happy").with_id("first"));
    {
        let mut file = OpenOptions::new().append(true).open(store.path()).unwrap();
        writeln!(file, "{{\"type\": \"emotions\", \"sample_id\": ").unwrap();
    }
    engine.process_sample(&TextSample::new("chat", "I feel lonely").with_id("second"));

    let records = store.load().unwrap();
    let samples: Vec<_> = records.iter().map(|r| r.sample_id.as_str()).collect();
    assert_eq!(samples, vec!["first", "second"]);

    let stats = engine.signal_stats().unwrap().unwrap();
    assert_eq!(stats.total_records, 2);
    assert_eq!(stats.by_type.get("emotions"), Some(&1));
    assert_eq!(stats.by_type.get("risks"), Some(&1));
}

#[test]
fn test_store_reopens_existing_log() {
    let dir = TempDir::new().unwrap();
    let engine = engine_at(&dir);
    engine.process_sample(&TextSample::new("chat", "I feel hopeless"));

    let reopened = SignalStore::open(engine.store().unwrap().path()).unwrap();
    let risks = reopened.load_by_type(RecordType::Risks).unwrap();
    assert_eq!(risks.len(), 1);
    assert_eq!(risks[0].data[0]["kind"], "hopelessness");
}

// =============================================================================
// Trends
// =============================================================================

#[test]
fn test_downhill_over_five_days() {
    let dir = TempDir::new().unwrap();
    let engine = engine_at(&dir);
    let now = Utc::now();

    // Joy fades while risk builds up
    let days = [
        "happy glad joy cheerful",
        "happy glad and a little alone",
        "happy yet hopeless",
        "i want to die",
        "i want to die, kill myself",
    ];
    for (i, text) in days.iter().enumerate() {
        let sample = TextSample::new("journal", *text)
            .with_timestamp(now - Duration::days(5 - i as i64));
        engine.process_sample(&sample);
    }

    let records = engine.store().unwrap().load().unwrap();
    match analyze_downhill(&records, 7, now) {
        TrendOutcome::Alert(alert) => {
            assert!(alert.joy_trend < -0.1);
            assert!(alert.risk_trend > 0.1);
        }
        other => panic!("expected a downhill alert, got {:?}", other),
    }

    let summary = engine.analyze_window(7).expect("records in window");
    assert!(summary.alert_detected);
    assert!(summary.alert.is_some());
}

#[test]
fn test_old_records_outside_window() {
    let dir = TempDir::new().unwrap();
    let engine = engine_at(&dir);
    let store = engine.store().unwrap();
    let old = Utc::now() - Duration::days(30);

    store
        .append(&SignalRecord::new(RecordType::Emotions, "old", old, vec![]))
        .unwrap();

    assert!(engine.analyze_window(7).is_none());
    let summary = engine.window_summary(7).unwrap().unwrap();
    assert_eq!(summary.counts.get("emotions"), Some(&0));
}
