//! Output events emitted after every segmenter step.

use serde::{Deserialize, Serialize};

/// Discrete moments in a sequence's life.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    /// A held gesture was appended to the sequence.
    Committed { word: String },
    /// A completed sequence was cleared by a new, different gesture.
    SequenceReset,
    /// Silence outlasted the timeout; the sequence is final.
    SequenceComplete,
}

/// Read model returned for each processed frame.
///
/// Re-derived from the segmentation state on every call; it is not a
/// source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputEvent {
    /// Label to show for this frame, or a waiting/unidentified sentinel.
    pub display_label: String,
    /// Confidence of this frame, rounded to two decimals.
    pub confidence: f32,
    /// Confirmed words so far.
    pub sequence: Vec<String>,
    /// True once the sequence has been declared complete.
    pub sequence_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<Transition>,
}

impl OutputEvent {
    /// Returns the committed word if this frame appended one.
    pub fn committed(&self) -> Option<&str> {
        match &self.transition {
            Some(Transition::Committed { word }) => Some(word),
            _ => None,
        }
    }

    /// Returns true if this frame declared the sequence complete.
    pub fn completed(&self) -> bool {
        matches!(self.transition, Some(Transition::SequenceComplete))
    }
}

/// Round to two decimals for display.
pub(crate) fn round_confidence(confidence: f32) -> f32 {
    (confidence * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(transition: Option<Transition>) -> OutputEvent {
        OutputEvent {
            display_label: "hello".to_string(),
            confidence: 0.93,
            sequence: vec!["hello".to_string()],
            sequence_complete: false,
            transition,
        }
    }

    #[test]
    fn test_transition_omitted_from_json_when_absent() {
        let json = serde_json::to_string(&event(None)).unwrap();
        assert_eq!(
            json,
            r#"{"display_label":"hello","confidence":0.93,"sequence":["hello"],"sequence_complete":false}"#
        );
    }

    #[test]
    fn test_committed_transition_serializes_tagged() {
        let json = serde_json::to_string(&event(Some(Transition::Committed {
            word: "hello".to_string(),
        })))
        .unwrap();
        assert!(json.contains(r#""transition":{"kind":"committed","word":"hello"}"#));
    }

    #[test]
    fn test_accessors() {
        let committed = event(Some(Transition::Committed {
            word: "hi".to_string(),
        }));
        assert_eq!(committed.committed(), Some("hi"));
        assert!(!committed.completed());

        let done = event(Some(Transition::SequenceComplete));
        assert!(done.completed());
        assert_eq!(done.committed(), None);
    }

    #[test]
    fn test_round_confidence() {
        assert_eq!(round_confidence(0.876), 0.88);
        assert_eq!(round_confidence(0.0), 0.0);
        assert_eq!(round_confidence(1.0), 1.0);
    }
}
