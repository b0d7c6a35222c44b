//! Configuration for the LUMIRA engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

use lumira_core::MatchMode;
use lumira_signals::DEFAULT_WINDOW_DAYS;

/// Default data directory.
pub const DEFAULT_DATA_DIR: &str = ".lumira";

/// Signal log file name inside the data directory.
pub const SIGNALS_FILE: &str = "signals.jsonl";

/// Configuration for a [`LumiraEngine`](crate::LumiraEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LumiraConfig {
    /// Module flags
    pub flags: FeatureFlags,
    /// Signal log path
    pub db_path: PathBuf,
    /// Lexicon term matching
    pub match_mode: MatchMode,
    /// YAML emotion lexicon replacing the bundled one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion_lexicon_path: Option<PathBuf>,
    /// YAML risk lexicon replacing the bundled one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_lexicon_path: Option<PathBuf>,
    /// Report conflicting emotions as integrity signals
    pub promote_emotion_conflicts: bool,
    /// Trend window used when none is given
    pub window_days: u32,
}

impl Default for LumiraConfig {
    fn default() -> Self {
        Self {
            flags: FeatureFlags::default(),
            db_path: PathBuf::from(DEFAULT_DATA_DIR).join(SIGNALS_FILE),
            match_mode: MatchMode::default(),
            emotion_lexicon_path: None,
            risk_lexicon_path: None,
            promote_emotion_conflicts: false,
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

impl LumiraConfig {
    /// Config with the given flags and default paths.
    pub fn with_flags(flags: FeatureFlags) -> Self {
        Self {
            flags,
            ..Default::default()
        }
    }

    /// Set the signal log path.
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    /// Set the term matching mode.
    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    /// Load config from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load config from `LUMIRA_*` variables supplied by `lookup`.
    ///
    /// Unset variables keep their defaults. When only `LUMIRA_DATA_DIR` is
    /// set, the signal log lives inside it.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let flag = |name: &str, default: bool| lookup(name).map_or(default, |v| is_truthy(&v));

        let flags = FeatureFlags {
            enabled: flag("LUMIRA_ENABLED", defaults.flags.enabled),
            semantics_enabled: flag("LUMIRA_SEMANTICS_ENABLED", defaults.flags.semantics_enabled),
            safety_enabled: flag("LUMIRA_SAFETY_ENABLED", defaults.flags.safety_enabled),
            signals_enabled: flag("LUMIRA_SIGNALS_ENABLED", defaults.flags.signals_enabled),
        };

        let db_path = match (lookup("LUMIRA_DB_PATH"), lookup("LUMIRA_DATA_DIR")) {
            (Some(path), _) => PathBuf::from(path),
            (None, Some(dir)) => PathBuf::from(dir).join(SIGNALS_FILE),
            (None, None) => defaults.db_path.clone(),
        };

        let window_days = match lookup("LUMIRA_WINDOW_DAYS") {
            Some(value) => value.trim().parse().unwrap_or_else(|_| {
                warn!(value = %value, "Invalid LUMIRA_WINDOW_DAYS, using default");
                defaults.window_days
            }),
            None => defaults.window_days,
        };

        let match_mode = match lookup("LUMIRA_MATCH_MODE") {
            Some(value) => MatchMode::parse(&value).unwrap_or_else(|| {
                warn!(value = %value, "Unknown LUMIRA_MATCH_MODE, using substring matching");
                defaults.match_mode
            }),
            None => defaults.match_mode,
        };

        Self {
            flags,
            db_path,
            match_mode,
            emotion_lexicon_path: lookup("LUMIRA_EMOTION_LEXICON").map(PathBuf::from),
            risk_lexicon_path: lookup("LUMIRA_RISK_LEXICON").map(PathBuf::from),
            promote_emotion_conflicts: flag(
                "LUMIRA_PROMOTE_CONFLICTS",
                defaults.promote_emotion_conflicts,
            ),
            window_days,
        }
    }

    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Module switches. Everything is off unless enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Master flag, reported by the engine
    pub enabled: bool,
    /// Emotion scoring and incongruence detection
    pub semantics_enabled: bool,
    /// Safety risk detection and escalation
    pub safety_enabled: bool,
    /// Signal log persistence and trend analysis
    pub signals_enabled: bool,
}

impl FeatureFlags {
    /// Every module enabled.
    pub fn all() -> Self {
        Self {
            enabled: true,
            semantics_enabled: true,
            safety_enabled: true,
            signals_enabled: true,
        }
    }
}

/// Truthy flag values: `true`, `1`, `yes`, `on`, `enabled` (any case).
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on" | "enabled"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LumiraConfig::default();
        assert_eq!(config.flags, FeatureFlags::default());
        assert!(!config.flags.semantics_enabled);
        assert_eq!(config.db_path, PathBuf::from(".lumira/signals.jsonl"));
        assert_eq!(config.match_mode, MatchMode::Substring);
        assert_eq!(config.window_days, 7);
    }

    #[test]
    fn test_truthy_values() {
        for value in ["true", "1", "yes", "on", "enabled", "TRUE", " On "] {
            assert!(is_truthy(value), "{value} should be truthy");
        }
        for value in ["false", "0", "off", "", "disabled", "y"] {
            assert!(!is_truthy(value), "{value} should be falsy");
        }
    }

    #[test]
    fn test_from_vars() {
        let config = LumiraConfig::from_vars(vars(&[
            ("LUMIRA_ENABLED", "yes"),
            ("LUMIRA_SEMANTICS_ENABLED", "1"),
            ("LUMIRA_SAFETY_ENABLED", "Enabled"),
            ("LUMIRA_SIGNALS_ENABLED", "no"),
            ("LUMIRA_DB_PATH", "/tmp/lumira/log.jsonl"),
            ("LUMIRA_MATCH_MODE", "word_boundary"),
            ("LUMIRA_WINDOW_DAYS", "14"),
        ]));

        assert!(config.flags.enabled);
        assert!(config.flags.semantics_enabled);
        assert!(config.flags.safety_enabled);
        assert!(!config.flags.signals_enabled);
        assert_eq!(config.db_path, PathBuf::from("/tmp/lumira/log.jsonl"));
        assert_eq!(config.match_mode, MatchMode::WordBoundary);
        assert_eq!(config.window_days, 14);
    }

    #[test]
    fn test_data_dir_moves_default_log() {
        let config = LumiraConfig::from_vars(vars(&[("LUMIRA_DATA_DIR", "/var/lib/lumira")]));
        assert_eq!(config.db_path, PathBuf::from("/var/lib/lumira/signals.jsonl"));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = LumiraConfig::from_vars(vars(&[
            ("LUMIRA_MATCH_MODE", "fuzzy"),
            ("LUMIRA_WINDOW_DAYS", "a week"),
        ]));
        assert_eq!(config.match_mode, MatchMode::Substring);
        assert_eq!(config.window_days, 7);
    }

    #[test]
    fn test_no_vars_is_default() {
        assert_eq!(LumiraConfig::from_vars(|_| None), LumiraConfig::default());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = LumiraConfig::with_flags(FeatureFlags::all())
            .with_db_path("data/signals.jsonl")
            .with_match_mode(MatchMode::WordBoundary);
        let yaml = config.to_yaml().unwrap();
        assert_eq!(LumiraConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = LumiraConfig::from_yaml("flags:\n  safety_enabled: true\n").unwrap();
        assert!(config.flags.safety_enabled);
        assert!(!config.flags.signals_enabled);
        assert_eq!(config.window_days, 7);
    }
}
