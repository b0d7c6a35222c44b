//! Append-only JSONL signal store.
//!
//! Each record is one JSON object on its own line. Records are only ever
//! appended; the whole log can be cleared but individual records are never
//! rewritten. A single writer is assumed.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use lumira_core::{EmotionScore, IntegritySignal, RiskFlag};

use crate::record::{RecordType, SignalRecord};

/// Signal store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// File system failure
    #[error("Signal store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be serialized
    #[error("Signal record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// JSONL-backed signal store.
#[derive(Debug, Clone)]
pub struct SignalStore {
    path: PathBuf,
}

impl SignalStore {
    /// Open a store at `path`, creating the parent directory if needed.
    ///
    /// The log file itself is created on first append.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record.
    ///
    /// A trailing line left without a newline (an interrupted write) is
    /// terminated first, so the new record always starts on its own line.
    pub fn append(&self, record: &SignalRecord) -> Result<()> {
        let mut line = record.to_jsonl()?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;
        if ends_mid_line(&mut file)? {
            warn!(path = %self.path.display(), "Terminating partial signal line");
            line.insert(0, '\n');
        }
        // One write per record keeps lines whole for a single writer.
        file.write_all(line.as_bytes())?;

        debug!(
            kind = %record.kind,
            sample_id = %record.sample_id,
            entries = record.data.len(),
            "Signal record appended"
        );
        Ok(())
    }

    /// Append an `emotions` record.
    pub fn append_emotions(
        &self,
        sample_id: &str,
        timestamp: DateTime<Utc>,
        emotions: &[EmotionScore],
    ) -> Result<()> {
        self.append(&SignalRecord::emotions(sample_id, timestamp, emotions)?)
    }

    /// Append a `risks` record.
    pub fn append_risks(
        &self,
        sample_id: &str,
        timestamp: DateTime<Utc>,
        risks: &[RiskFlag],
    ) -> Result<()> {
        self.append(&SignalRecord::risks(sample_id, timestamp, risks)?)
    }

    /// Append an `integrity` record.
    pub fn append_integrity(
        &self,
        sample_id: &str,
        timestamp: DateTime<Utc>,
        signals: &[IntegritySignal],
    ) -> Result<()> {
        self.append(&SignalRecord::integrity(sample_id, timestamp, signals)?)
    }

    /// Load every readable record in file order.
    ///
    /// Lines that are not valid UTF-8 or not a valid record are skipped with
    /// a warning. A missing file is an empty log.
    pub fn load(&self) -> Result<Vec<SignalRecord>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        let mut skipped = 0usize;

        for (index, raw) in bytes.split(|b| *b == b'\n').enumerate() {
            let line = match std::str::from_utf8(raw) {
                Ok(line) => line.trim(),
                Err(e) => {
                    warn!(line = index + 1, error = %e, "Skipping non UTF-8 signal line");
                    skipped += 1;
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<SignalRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(line = index + 1, error = %e, "Skipping corrupt signal line");
                    skipped += 1;
                }
            }
        }

        debug!(
            path = %self.path.display(),
            records = records.len(),
            skipped = skipped,
            "Signal log loaded"
        );
        Ok(records)
    }

    /// Records with a timestamp at or after `cutoff`.
    pub fn load_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<SignalRecord>> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|r| r.timestamp >= cutoff)
            .collect())
    }

    /// Records from the last `days` days.
    pub fn load_recent(&self, days: u32) -> Result<Vec<SignalRecord>> {
        self.load_since(Utc::now() - Duration::days(i64::from(days)))
    }

    /// Records of one type.
    pub fn load_by_type(&self, kind: RecordType) -> Result<Vec<SignalRecord>> {
        Ok(self.load()?.into_iter().filter(|r| r.kind == kind).collect())
    }

    /// Records for one sample.
    pub fn load_by_sample(&self, sample_id: &str) -> Result<Vec<SignalRecord>> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|r| r.sample_id == sample_id)
            .collect())
    }

    /// Counts and time range of the stored records.
    pub fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats::from_records(&self.load()?))
    }

    /// Remove every record.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Signal log cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Store statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    pub total_records: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_sample: BTreeMap<String, usize>,
    pub date_range: DateRange,
}

/// Earliest and latest record timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earliest: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<DateTime<Utc>>,
}

impl StoreStats {
    /// Compute statistics over a record set.
    pub fn from_records(records: &[SignalRecord]) -> Self {
        let mut stats = Self {
            total_records: records.len(),
            ..Self::default()
        };

        for record in records {
            *stats
                .by_type
                .entry(record.kind.as_str().to_string())
                .or_insert(0) += 1;
            *stats.by_sample.entry(record.sample_id.clone()).or_insert(0) += 1;
        }

        stats.date_range = DateRange {
            earliest: records.iter().map(|r| r.timestamp).min(),
            latest: records.iter().map(|r| r.timestamp).max(),
        };
        stats
    }
}

/// Whether the file is non-empty and its last byte is not a newline.
fn ends_mid_line(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}
