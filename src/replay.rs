//! Offline replay of recorded observation logs.
//!
//! A log is JSON Lines, one [`ObservationRecord`] per line:
//!
//! ```text
//! {"label": "hello", "confidence": 0.91, "offset_ms": 0}
//! {"offset_ms": 33}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use crate::error::{Result, SignseqError};
use crate::segment::{
    BatchConfig, ClipResult, ObservationRecord, OutputEvent, Segmenter, SegmenterConfig,
    process_clip,
};
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Parse a JSON Lines observation log.
pub fn parse_records(contents: &str) -> Result<Vec<ObservationRecord>> {
    let mut records = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let record =
            serde_json::from_str(line).map_err(|e| SignseqError::ReplayParse {
                line: index + 1,
                message: e.to_string(),
            })?;
        records.push(record);
    }
    Ok(records)
}

/// Read an observation log from disk.
pub fn read_records(path: &Path) -> Result<Vec<ObservationRecord>> {
    let contents = fs::read_to_string(path)?;
    parse_records(&contents)
}

/// Feed records through a fresh live segmenter, one event per record.
///
/// Timestamps come from each record's `offset_ms`, so the result does not
/// depend on how fast the log is replayed.
pub fn replay(records: &[ObservationRecord], config: &SegmenterConfig) -> Vec<OutputEvent> {
    let origin = Instant::now();
    let mut segmenter = Segmenter::with_config(config.clone());
    records
        .iter()
        .map(|record| segmenter.process(&record.to_observation(origin)))
        .collect()
}

/// Aggregate a whole log as one clip.
pub fn aggregate_records(records: &[ObservationRecord], config: &BatchConfig) -> ClipResult {
    process_clip(records, config)
}
