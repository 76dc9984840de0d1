//! Whole-clip segmentation by frequency voting.
//!
//! Used when every frame of a clip is available up front. Instead of hold and
//! silence timers, each confident label is counted across the clip and the
//! labels that occur often enough are returned, most frequent first. This
//! deliberately ignores temporal order.

use crate::defaults;
use crate::segment::observation::{Observation, ObservationRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// Tuning for batch aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    /// Frames must be strictly above this confidence to be counted.
    pub confidence_threshold: f32,
    /// Labels must occur strictly more often than this to survive.
    pub min_occurrence_count: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: defaults::CONFIDENCE_THRESHOLD,
            min_occurrence_count: defaults::MIN_OCCURRENCE_COUNT,
        }
    }
}

/// Result of processing a whole clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipResult {
    pub label_sequence: Vec<String>,
}

/// Counts confident named labels and returns the frequent ones by count.
///
/// Ties are broken by first appearance in the clip.
pub fn aggregate<'a, I>(
    observations: I,
    confidence_threshold: f32,
    min_occurrence_count: usize,
) -> Vec<String>
where
    I: IntoIterator<Item = &'a Observation>,
{
    // (count, first index)
    let mut tally: HashMap<&str, (usize, usize)> = HashMap::new();

    for (index, observation) in observations.into_iter().enumerate() {
        let Some(label) = observation.confident_label(confidence_threshold) else {
            continue;
        };
        if !label.is_committable() {
            continue;
        }
        tally.entry(label.as_str()).or_insert((0, index)).0 += 1;
    }

    let mut survivors: Vec<(&str, usize, usize)> = tally
        .into_iter()
        .filter(|(_, (count, _))| *count > min_occurrence_count)
        .map(|(name, (count, first))| (name, count, first))
        .collect();
    survivors.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    survivors
        .into_iter()
        .map(|(name, _, _)| name.to_string())
        .collect()
}

/// Aggregates a clip of wire records with `config`.
pub fn process_clip(records: &[ObservationRecord], config: &BatchConfig) -> ClipResult {
    let origin = Instant::now();
    let observations: Vec<Observation> = records
        .iter()
        .map(|r| r.to_observation(origin))
        .collect();

    let label_sequence = aggregate(
        &observations,
        config.confidence_threshold,
        config.min_occurrence_count,
    );
    log::debug!(
        "Aggregated {} frames into {:?}",
        records.len(),
        label_sequence
    );

    ClipResult { label_sequence }
}
