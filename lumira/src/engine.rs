//! LumiraEngine - the analysis orchestrator.
//!
//! Runs the enabled detectors over a sample, assembles the report and
//! forwards findings to the signal log. A failing module never takes the
//! report down with it: each module runs behind a panic guard and storage
//! errors are logged and skipped.

use chrono::{Duration, Utc};
use serde::Serialize;
use std::fs;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use tracing::{debug, error, info, warn};

use lumira_analysis::{
    featurize, EmotionScorer, IncongruenceDetector, SafetyDetector, TextFeatures,
};
use lumira_core::{AnalysisReport, CoreError, LexiconTable, PatternSet, RiskLexicon, TextSample};
use lumira_signals::{
    RecordType, SignalStore, SignalSummary, StoreError, StoreStats, TrendSummary,
};

use crate::config::LumiraConfig;

/// Engine errors.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Lexicon or pattern failure
    #[error("Lexicon error: {0}")]
    Core(#[from] CoreError),

    /// Signal log failure
    #[error("Signal store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Modules an engine runs with. Missing modules are skipped.
#[derive(Debug, Clone, Default)]
pub struct EngineComponents {
    pub scorer: Option<EmotionScorer>,
    pub incongruence: Option<IncongruenceDetector>,
    pub safety: Option<SafetyDetector>,
    pub store: Option<SignalStore>,
}

/// Which modules are enabled and loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleStatus {
    pub lumira_enabled: bool,
    pub semantics_enabled: bool,
    pub safety_enabled: bool,
    pub signals_enabled: bool,
    pub semantic_pipeline_loaded: bool,
    pub safety_detector_loaded: bool,
    pub signal_store_loaded: bool,
}

/// The LUMIRA analysis engine.
#[derive(Debug)]
pub struct LumiraEngine {
    /// Configuration
    config: LumiraConfig,
    /// Emotion scorer (semantics)
    scorer: Option<EmotionScorer>,
    /// Incongruence detector (semantics)
    incongruence: Option<IncongruenceDetector>,
    /// Safety detector
    safety: Option<SafetyDetector>,
    /// Signal log
    store: Option<SignalStore>,
}

impl LumiraEngine {
    /// Create an engine, building only the modules enabled in `config`.
    pub fn new(config: LumiraConfig) -> Result<Self> {
        let flags = config.flags;
        let mut components = EngineComponents::default();

        if flags.semantics_enabled {
            let lexicon = match &config.emotion_lexicon_path {
                Some(path) => LexiconTable::from_yaml(&read_config_file(path)?)?,
                None => LexiconTable::builtin(),
            };
            components.scorer =
                Some(EmotionScorer::with_lexicon(lexicon).with_match_mode(config.match_mode));
            components.incongruence = Some(IncongruenceDetector::new());
        }

        if flags.safety_enabled {
            let lexicon = match &config.risk_lexicon_path {
                Some(path) => RiskLexicon::from_yaml(&read_config_file(path)?)?,
                None => RiskLexicon::builtin(),
            };
            components.safety = Some(
                SafetyDetector::with_lexicon(lexicon, PatternSet::escalation())
                    .with_match_mode(config.match_mode),
            );
        }

        if flags.signals_enabled {
            if config.db_path.as_os_str().is_empty() {
                return Err(EngineError::Config(
                    "signals enabled without a signal log path".to_string(),
                ));
            }
            components.store = Some(SignalStore::open(&config.db_path)?);
        }

        info!(
            semantics = flags.semantics_enabled,
            safety = flags.safety_enabled,
            signals = flags.signals_enabled,
            db_path = %config.db_path.display(),
            "LumiraEngine created"
        );

        Ok(Self::with_components(config, components))
    }

    /// Create with injected modules.
    ///
    /// A module only runs when it is present and its flag is enabled.
    pub fn with_components(config: LumiraConfig, components: EngineComponents) -> Self {
        Self {
            config,
            scorer: components.scorer,
            incongruence: components.incongruence,
            safety: components.safety,
            store: components.store,
        }
    }

    pub fn config(&self) -> &LumiraConfig {
        &self.config
    }

    /// The signal log, if loaded.
    pub fn store(&self) -> Option<&SignalStore> {
        self.store.as_ref()
    }

    /// Master flag.
    pub fn is_enabled(&self) -> bool {
        self.config.flags.enabled
    }

    /// Analyze a sample and record the findings.
    ///
    /// Always returns a report. Modules that are disabled, missing or that
    /// panic contribute nothing.
    pub fn process_sample(&self, sample: &TextSample) -> AnalysisReport {
        let flags = self.config.flags;
        let mut report = AnalysisReport::empty(sample.id.clone());

        if flags.semantics_enabled {
            if let Some(scorer) = &self.scorer {
                if let Some(emotions) = guarded("emotions", &sample.id, || scorer.classify(sample)) {
                    report.emotions = emotions;
                }
            }

            if let Some(detector) = &self.incongruence {
                let emotions = &report.emotions;
                let found = guarded("incongruence", &sample.id, || {
                    (
                        detector.detect(&sample.text),
                        detector.emotion_conflicts(emotions),
                    )
                });
                if let Some((signals, conflicts)) = found {
                    report.integrity.extend(signals);
                    if self.config.promote_emotion_conflicts {
                        report
                            .integrity
                            .extend(conflicts.iter().map(|c| c.to_signal()));
                    }
                    report.conflicts = conflicts;
                }
            }
        }

        if flags.safety_enabled {
            if let Some(detector) = &self.safety {
                let found = guarded("safety", &sample.id, || {
                    let risks = detector.analyze(sample);
                    let escalations = detector.escalate(&risks, &sample.meta);
                    (risks, escalations)
                });
                if let Some((risks, escalations)) = found {
                    report.risks = risks;
                    report.integrity.extend(escalations);
                }
            }
        }

        if flags.signals_enabled {
            if let Some(store) = &self.store {
                persist(store, sample, &report);
            }
        }

        debug!(
            sample_id = %sample.id,
            emotions = report.emotions.len(),
            risks = report.risks.len(),
            integrity = report.integrity.len(),
            "Sample processed"
        );

        report
    }

    /// Surface features of a sample, when semantics is loaded.
    pub fn features(&self, sample: &TextSample) -> Option<TextFeatures> {
        if !self.config.flags.semantics_enabled {
            return None;
        }
        let scorer = self.scorer.as_ref()?;
        let detector = self.incongruence.as_ref()?;
        Some(featurize(sample, scorer, detector))
    }

    /// Trend analysis over the configured `window_days`.
    pub fn analyze_default_window(&self) -> Option<TrendSummary> {
        self.analyze_window(self.config.window_days)
    }

    /// Trend analysis over the last `days` days.
    ///
    /// `None` when signals are disabled, the window holds no records, or the
    /// log cannot be read.
    pub fn analyze_window(&self, days: u32) -> Option<TrendSummary> {
        let store = self.active_store()?;
        let now = Utc::now();

        let records = match store.load_since(now - Duration::days(i64::from(days))) {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, window_days = days, "Window analysis failed");
                return None;
            }
        };
        if records.is_empty() {
            return None;
        }

        let summary = TrendSummary::from_records(&records, days, now);
        if summary.alert_detected {
            warn!(
                window_days = days,
                total_records = summary.total_records,
                "Downhill trend detected"
            );
        }
        Some(summary)
    }

    /// Signal log statistics, `None` when signals are disabled.
    pub fn signal_stats(&self) -> Result<Option<StoreStats>> {
        match self.active_store() {
            Some(store) => Ok(Some(store.stats()?)),
            None => Ok(None),
        }
    }

    /// Summary of the configured `window_days`.
    pub fn default_window_summary(&self) -> Result<Option<SignalSummary>> {
        self.window_summary(self.config.window_days)
    }

    /// Summary of the last `days` days, `None` when signals are disabled.
    pub fn window_summary(&self, days: u32) -> Result<Option<SignalSummary>> {
        match self.active_store() {
            Some(store) => {
                let records = store.load()?;
                Ok(Some(SignalSummary::build(&records, days, Utc::now())))
            }
            None => Ok(None),
        }
    }

    /// Module enablement and load state.
    pub fn module_status(&self) -> ModuleStatus {
        let flags = self.config.flags;
        ModuleStatus {
            lumira_enabled: flags.enabled,
            semantics_enabled: flags.semantics_enabled,
            safety_enabled: flags.safety_enabled,
            signals_enabled: flags.signals_enabled,
            semantic_pipeline_loaded: self.scorer.is_some() && self.incongruence.is_some(),
            safety_detector_loaded: self.safety.is_some(),
            signal_store_loaded: self.store.is_some(),
        }
    }

    fn active_store(&self) -> Option<&SignalStore> {
        if self.config.flags.signals_enabled {
            self.store.as_ref()
        } else {
            None
        }
    }
}

/// Run one module, turning a panic into `None`.
fn guarded<T>(module: &str, sample_id: &str, f: impl FnOnce() -> T) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(_) => {
            error!(
                module = module,
                sample_id = sample_id,
                "Analysis module panicked, continuing without it"
            );
            None
        }
    }
}

/// Append the non-empty payloads of a report.
fn persist(store: &SignalStore, sample: &TextSample, report: &AnalysisReport) {
    let mut results = Vec::with_capacity(3);
    if !report.emotions.is_empty() {
        results.push((
            RecordType::Emotions,
            store.append_emotions(&sample.id, sample.timestamp, &report.emotions),
        ));
    }
    if !report.risks.is_empty() {
        results.push((
            RecordType::Risks,
            store.append_risks(&sample.id, sample.timestamp, &report.risks),
        ));
    }
    if !report.integrity.is_empty() {
        results.push((
            RecordType::Integrity,
            store.append_integrity(&sample.id, sample.timestamp, &report.integrity),
        ));
    }

    for (kind, result) in results {
        if let Err(e) = result {
            warn!(
                error = %e,
                kind = %kind,
                sample_id = %sample.id,
                "Signal storage failed"
            );
        }
    }
}

fn read_config_file(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| EngineError::Config(format!("cannot read {}: {}", path.display(), e)))
}
