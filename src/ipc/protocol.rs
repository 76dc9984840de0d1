//! Newline-delimited JSON messages exchanged with the daemon.
//!
//! A connection is one session. Every frame request gets exactly one
//! response line back, in order.

use crate::segment::{ClipResult, ObservationRecord, OutputEvent};
use serde::{Deserialize, Serialize};

/// Requests sent by a capture client to the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Landmark feature vector for one frame.
    Features {
        values: Vec<f32>,
        /// Capture time relative to the first frame of the connection.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset_ms: Option<u64>,
    },
    /// Frame already classified on the client side.
    Observation {
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        confidence: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset_ms: Option<u64>,
    },
    /// Frame with no hand landmarks.
    NoHand {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset_ms: Option<u64>,
    },
    /// Whole pre-recorded clip for batch aggregation.
    Clip { observations: Vec<ObservationRecord> },
    /// Daemon status.
    Status,
}

impl Request {
    /// Serialize request to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize request from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Client capture offset, if the request carries one.
    pub fn offset_ms(&self) -> Option<u64> {
        match self {
            Request::Features { offset_ms, .. }
            | Request::Observation { offset_ms, .. }
            | Request::NoHand { offset_ms } => *offset_ms,
            Request::Clip { .. } | Request::Status => None,
        }
    }
}

/// Responses sent by the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Segmenter output for one frame.
    Event(OutputEvent),
    /// Result of a batch clip.
    Clip(ClipResult),
    /// Current daemon status
    Status {
        sessions: usize,
        classifier: String,
        labels: usize,
    },
    /// Error occurred
    Error { message: String },
}

impl Response {
    /// Serialize response to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize response from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
