//! signseq - gesture sequence segmentation for sign-language recognition
//!
//! Turns per-frame classifier observations into de-bounced word sequences,
//! either live (one state machine per session) or for whole clips.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod classify;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod daemon;
pub mod defaults;
pub mod error;
pub mod ipc;
pub mod output;
pub mod replay;
pub mod segment;
pub mod session;

// Core segmentation
pub use segment::{
    BatchConfig, ClipResult, Label, Observation, ObservationRecord, OutputEvent, Segmenter,
    SegmenterConfig, SegmentationState, Transition, aggregate, process_clip,
};

// Classification boundary
pub use classify::{Classification, Classifier, LabelMap, ObservationSource};

// Sessions
pub use session::{SessionHandle, SessionId, SessionStore};

// Error handling
pub use error::{Result, SignseqError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_has_hash_only_when_built_from_git() {
        let ver = version_string();
        if option_env!("GIT_HASH").is_some_and(|h| !h.is_empty()) {
            assert!(ver.contains('+'), "got: {}", ver);
        } else {
            assert_eq!(ver, env!("CARGO_PKG_VERSION"));
        }
    }
}
