//! Default configuration constants for signseq.
//!
//! Shared by `SegmenterConfig`, `BatchConfig` and the TOML `Config` so the
//! library and the daemon agree on the same tuning.

/// Minimum classifier confidence for an observation to count as a detection.
///
/// The comparison is exclusive: a confidence exactly equal to the threshold
/// is treated as "not detected".
pub const CONFIDENCE_THRESHOLD: f32 = 0.6;

/// How long (ms) a gesture must be continuously recognized before it is
/// appended to the sequence.
///
/// Deployed values ranged from 250ms to 1000ms; 250ms keeps fast signers
/// responsive while still rejecting single-frame flickers at typical webcam
/// frame rates.
pub const HOLD_TIME_MS: u64 = 250;

/// Silence (ms) without a confident detection before the sequence is
/// declared complete.
pub const SILENCE_TIMEOUT_MS: u64 = 3000;

/// Time (ms) after the last confident detection at which the remembered
/// label is forgotten, so the same gesture can be held again.
pub const LABEL_FORGET_TIMEOUT_MS: u64 = 2000;

/// A label must occur strictly more often than this in a clip to survive
/// batch aggregation.
pub const MIN_OCCURRENCE_COUNT: usize = 5;

/// Number of tracked hand landmarks.
pub const LANDMARK_COUNT: usize = 21;

/// Feature vector length: x and y per landmark.
pub const FEATURE_LEN: usize = LANDMARK_COUNT * 2;

/// Display label when nothing was detected.
pub const WAITING_LABEL: &str = "Waiting...";

/// Display label when a hand was seen but the classifier was not confident.
pub const UNIDENTIFIED_LABEL: &str = "Gesture Unidentified";

/// Display name of a classifier index that is missing from the label map.
pub const UNKNOWN_LABEL: &str = "Unknown";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_len_is_two_coordinates_per_landmark() {
        assert_eq!(FEATURE_LEN, 42);
    }

    #[test]
    fn silence_outlasts_label_forgetting() {
        assert!(SILENCE_TIMEOUT_MS > LABEL_FORGET_TIMEOUT_MS);
        assert!(LABEL_FORGET_TIMEOUT_MS > HOLD_TIME_MS);
    }

    #[test]
    fn sentinels_are_distinct() {
        assert_ne!(WAITING_LABEL, UNIDENTIFIED_LABEL);
        assert_ne!(UNIDENTIFIED_LABEL, UNKNOWN_LABEL);
        assert_ne!(WAITING_LABEL, UNKNOWN_LABEL);
    }
}
