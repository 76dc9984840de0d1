//! Per-frame observation types fed into the segmenter.

use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// A classifier label.
///
/// `Unknown` is produced when the classifier emits an index that the label
/// map does not cover. It takes part in hold timing like any other label but
/// is never committed to a sequence. Named labels that collide with a display
/// sentinel are treated the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    Named(String),
    Unknown,
}

impl Label {
    /// Creates a named label.
    pub fn named(name: impl Into<String>) -> Self {
        Label::Named(name.into())
    }

    /// Parses a wire name, mapping the unknown sentinel back to `Unknown`.
    pub fn from_wire(name: &str) -> Self {
        if name == defaults::UNKNOWN_LABEL {
            Label::Unknown
        } else {
            Label::Named(name.to_string())
        }
    }

    /// Display name of this label.
    pub fn as_str(&self) -> &str {
        match self {
            Label::Named(name) => name,
            Label::Unknown => defaults::UNKNOWN_LABEL,
        }
    }

    /// Returns true if this label may be appended to a sequence.
    pub fn is_committable(&self) -> bool {
        match self {
            Label::Named(name) => !is_sentinel(name),
            Label::Unknown => false,
        }
    }
}

/// Display strings the segmenter emits itself; never valid words.
fn is_sentinel(name: &str) -> bool {
    [
        defaults::UNKNOWN_LABEL,
        defaults::WAITING_LABEL,
        defaults::UNIDENTIFIED_LABEL,
    ]
    .contains(&name)
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One frame's classifier output.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Predicted label, or `None` when no hand was found.
    pub label: Option<Label>,
    /// Probability-like confidence in `[0, 1]`.
    pub confidence: f32,
    /// Monotonic arrival time of the frame.
    pub timestamp: Instant,
}

impl Observation {
    /// Creates an observation of `label` at `timestamp`.
    pub fn new(label: Label, confidence: f32, timestamp: Instant) -> Self {
        Self {
            label: Some(label),
            confidence,
            timestamp,
        }
    }

    /// Creates a "no hand detected" observation.
    pub fn none(timestamp: Instant) -> Self {
        Self {
            label: None,
            confidence: 0.0,
            timestamp,
        }
    }

    /// Returns the label if this observation clears `threshold` (exclusive).
    pub fn confident_label(&self, threshold: f32) -> Option<&Label> {
        match &self.label {
            Some(label) if self.confidence > threshold => Some(label),
            _ => None,
        }
    }

    /// Returns true if a hand was present, regardless of confidence.
    pub fn has_hand(&self) -> bool {
        self.label.is_some()
    }
}

/// Serializable observation without a monotonic timestamp.
///
/// Used on the wire and in replay logs. `offset_ms` is relative to the start
/// of the clip or log; it is ignored by batch aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub offset_ms: u64,
}

impl ObservationRecord {
    /// Converts to an `Observation` anchored at `origin + offset_ms`.
    pub fn to_observation(&self, origin: Instant) -> Observation {
        let timestamp = origin + std::time::Duration::from_millis(self.offset_ms);
        Observation {
            label: self.label.as_deref().map(Label::from_wire),
            confidence: self.confidence,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_exclusive() {
        let now = Instant::now();
        let at = Observation::new(Label::named("hello"), 0.6, now);
        assert!(at.confident_label(0.6).is_none());

        let above = Observation::new(Label::named("hello"), 0.61, now);
        assert_eq!(above.confident_label(0.6), Some(&Label::named("hello")));
    }

    #[test]
    fn test_none_observation_is_never_confident() {
        let obs = Observation {
            label: None,
            confidence: 1.0,
            timestamp: Instant::now(),
        };
        assert!(obs.confident_label(0.0).is_none());
        assert!(!obs.has_hand());
    }

    #[test]
    fn test_unknown_is_not_committable() {
        assert!(!Label::Unknown.is_committable());
        assert!(Label::named("yes").is_committable());
        assert_eq!(Label::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn test_sentinel_names_are_not_committable() {
        for name in ["Unknown", "Waiting...", "Gesture Unidentified"] {
            assert!(!Label::from_wire(name).is_committable(), "{}", name);
            assert!(!Label::named(name).is_committable(), "{}", name);
        }
        assert_eq!(Label::from_wire("Waiting...").as_str(), "Waiting...");
    }

    #[test]
    fn test_from_wire_maps_unknown_sentinel() {
        assert_eq!(Label::from_wire("Unknown"), Label::Unknown);
        assert_eq!(Label::from_wire("thanks"), Label::named("thanks"));
    }

    #[test]
    fn test_record_offsets_from_origin() {
        let origin = Instant::now();
        let record: ObservationRecord =
            serde_json::from_str(r#"{"label":"a","confidence":0.9,"offset_ms":150}"#).unwrap();
        let obs = record.to_observation(origin);
        assert_eq!(obs.label, Some(Label::named("a")));
        assert_eq!(
            obs.timestamp.duration_since(origin),
            std::time::Duration::from_millis(150)
        );
    }

    #[test]
    fn test_record_defaults_to_no_hand() {
        let record: ObservationRecord = serde_json::from_str("{}").unwrap();
        let obs = record.to_observation(Instant::now());
        assert!(obs.label.is_none());
        assert_eq!(obs.confidence, 0.0);
    }
}
