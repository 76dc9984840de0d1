//! Live segmentation state machine.
//!
//! Turns a per-frame stream of observations into a de-bounced sequence of
//! words:
//! - a label must be seen continuously for `hold_time` before it is committed
//! - the same label is never committed twice in a row
//! - `silence_timeout` without a confident detection completes the sequence
//! - a *different* label after completion starts a fresh sequence
//!
//! All timers are evaluated lazily against the timestamp of the frame being
//! processed. Nothing happens between frames.

use crate::defaults;
use crate::error::{Result, SignseqError};
use crate::segment::event::{OutputEvent, Transition, round_confidence};
use crate::segment::observation::{Label, Observation};
use log::{debug, info};
use std::time::{Duration, Instant};

/// Tuning for the live segmenter.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmenterConfig {
    /// Detections must be strictly above this confidence.
    pub confidence_threshold: f32,
    /// Continuous detection time before a label is committed.
    pub hold_time: Duration,
    /// Silence before the sequence is declared complete.
    pub silence_timeout: Duration,
    /// Time after the last detection at which the held label is forgotten.
    pub label_forget_timeout: Duration,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: defaults::CONFIDENCE_THRESHOLD,
            hold_time: Duration::from_millis(defaults::HOLD_TIME_MS),
            silence_timeout: Duration::from_millis(defaults::SILENCE_TIMEOUT_MS),
            label_forget_timeout: Duration::from_millis(defaults::LABEL_FORGET_TIMEOUT_MS),
        }
    }
}

impl SegmenterConfig {
    /// Checks that the values describe a usable machine.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.confidence_threshold) {
            return Err(SignseqError::ConfigInvalidValue {
                key: "segmenter.confidence_threshold".to_string(),
                message: format!("{} is outside [0, 1)", self.confidence_threshold),
            });
        }
        if self.silence_timeout.is_zero() {
            return Err(SignseqError::ConfigInvalidValue {
                key: "segmenter.silence_timeout_ms".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Internal machine state. Exactly one of these holds at any instant.
#[derive(Debug, Clone, PartialEq)]
enum Phase {
    /// Detections are arriving (or nothing happened yet); no hold is timed.
    /// `latched` is the label last committed or held, if still remembered.
    Idle { latched: Option<Label> },
    /// `label` has been detected continuously since `since`.
    Holding { label: Label, since: Instant },
    /// No confident detection since `since`; the silence timer is running.
    AwaitingSilence {
        latched: Option<Label>,
        since: Instant,
    },
    /// The sequence is final until a different label arrives.
    Complete {
        latched: Option<Label>,
        silence_since: Option<Instant>,
    },
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Idle { latched: None }
    }
}

/// Coarse machine state for status displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    Idle,
    Holding,
    AwaitingSilence,
    Complete,
}

/// Field-level view of the machine, for inspection and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationSnapshot {
    pub sequence: Vec<String>,
    pub last_confirmed_label: Option<Label>,
    pub hold_start: Option<Instant>,
    pub no_observation_start: Option<Instant>,
    pub last_observation_time: Option<Instant>,
    pub sequence_complete: bool,
}

/// Per-session segmentation state.
///
/// Owned by exactly one session; never shared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentationState {
    phase: Phase,
    sequence: Vec<String>,
    last_observation: Option<Instant>,
}

impl SegmentationState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one observation and returns the next state with its event.
    pub fn advance(
        mut self,
        config: &SegmenterConfig,
        observation: &Observation,
    ) -> (Self, OutputEvent) {
        let event = self.step(config, observation);
        (self, event)
    }

    /// In-place form of [`advance`](Self::advance).
    pub fn step(&mut self, config: &SegmenterConfig, observation: &Observation) -> OutputEvent {
        let now = observation.timestamp;
        let detected = observation
            .confident_label(config.confidence_threshold)
            .cloned();

        let transition = match &detected {
            Some(label) => self.on_detection(config, label.clone(), now),
            None => self.on_silence(config, now),
        };
        self.forget_stale_label(config, now);

        let (display_label, confidence) = match (&detected, &transition) {
            (_, Some(Transition::SequenceComplete)) => (defaults::WAITING_LABEL.to_string(), 0.0),
            (Some(label), _) => (
                label.as_str().to_string(),
                round_confidence(observation.confidence),
            ),
            (None, _) if observation.has_hand() => (
                defaults::UNIDENTIFIED_LABEL.to_string(),
                round_confidence(observation.confidence),
            ),
            (None, _) => (defaults::WAITING_LABEL.to_string(), 0.0),
        };

        OutputEvent {
            display_label,
            confidence,
            sequence: self.sequence.clone(),
            sequence_complete: self.is_complete(),
            transition,
        }
    }

    fn on_detection(
        &mut self,
        config: &SegmenterConfig,
        label: Label,
        now: Instant,
    ) -> Option<Transition> {
        let mut transition = None;

        self.phase = match std::mem::take(&mut self.phase) {
            Phase::Holding { label: held, since } if held == label => {
                let held_for = now.saturating_duration_since(since);
                let repeats_last = self.sequence.last().map(String::as_str) == Some(held.as_str());
                if held_for >= config.hold_time && held.is_committable() && !repeats_last {
                    let word = held.as_str().to_string();
                    info!("Committed '{}' after {:?}", word, held_for);
                    self.sequence.push(word.clone());
                    transition = Some(Transition::Committed { word });
                    Phase::Idle {
                        latched: Some(held),
                    }
                } else {
                    Phase::Holding { label: held, since }
                }
            }
            Phase::Holding { label: previous, .. } => {
                debug!("Hold switched from '{}' to '{}'", previous, label);
                Phase::Holding { label, since: now }
            }
            Phase::Idle { latched } | Phase::AwaitingSilence { latched, .. } => {
                if latched.as_ref() == Some(&label) {
                    Phase::Idle { latched }
                } else {
                    debug!("Holding '{}'", label);
                    Phase::Holding { label, since: now }
                }
            }
            // Only a different label restarts collection; the same label
            // may keep being shown after completion without clearing it.
            Phase::Complete { latched, .. } if latched.as_ref() == Some(&label) => {
                Phase::Complete {
                    latched,
                    silence_since: None,
                }
            }
            Phase::Complete { .. } => {
                info!("New sequence started by '{}'", label);
                self.sequence.clear();
                transition = Some(Transition::SequenceReset);
                Phase::Holding { label, since: now }
            }
        };

        self.last_observation = Some(now);
        transition
    }

    fn on_silence(&mut self, config: &SegmenterConfig, now: Instant) -> Option<Transition> {
        let mut transition = None;

        self.phase = match std::mem::take(&mut self.phase) {
            Phase::Holding { label, .. } => Phase::AwaitingSilence {
                latched: Some(label),
                since: now,
            },
            Phase::Idle { latched } => Phase::AwaitingSilence {
                latched,
                since: now,
            },
            Phase::AwaitingSilence { latched, since } => {
                if now.saturating_duration_since(since) >= config.silence_timeout
                    && !self.sequence.is_empty()
                {
                    info!("Sequence complete: {:?}", self.sequence);
                    transition = Some(Transition::SequenceComplete);
                    Phase::Complete {
                        latched,
                        silence_since: Some(since),
                    }
                } else {
                    Phase::AwaitingSilence { latched, since }
                }
            }
            Phase::Complete {
                latched,
                silence_since,
            } => Phase::Complete {
                latched,
                silence_since: silence_since.or(Some(now)),
            },
        };

        transition
    }

    fn forget_stale_label(&mut self, config: &SegmenterConfig, now: Instant) {
        let Some(last) = self.last_observation else {
            return;
        };
        if now.saturating_duration_since(last) <= config.label_forget_timeout {
            return;
        }

        self.phase = match std::mem::take(&mut self.phase) {
            Phase::Holding { .. } | Phase::Idle { .. } => Phase::Idle { latched: None },
            Phase::AwaitingSilence { latched, since } => {
                if let Some(label) = latched {
                    debug!("Forgot '{}'", label);
                }
                Phase::AwaitingSilence {
                    latched: None,
                    since,
                }
            }
            Phase::Complete { silence_since, .. } => Phase::Complete {
                latched: None,
                silence_since,
            },
        };
    }

    /// Confirmed words so far.
    pub fn sequence(&self) -> &[String] {
        &self.sequence
    }

    /// Returns true once the sequence has been declared complete.
    pub fn is_complete(&self) -> bool {
        matches!(self.phase, Phase::Complete { .. })
    }

    /// The label currently held or last committed, if still remembered.
    pub fn last_label(&self) -> Option<&Label> {
        match &self.phase {
            Phase::Holding { label, .. } => Some(label),
            Phase::Idle { latched }
            | Phase::AwaitingSilence { latched, .. }
            | Phase::Complete { latched, .. } => latched.as_ref(),
        }
    }

    /// Coarse state for display.
    pub fn kind(&self) -> PhaseKind {
        match self.phase {
            Phase::Idle { .. } => PhaseKind::Idle,
            Phase::Holding { .. } => PhaseKind::Holding,
            Phase::AwaitingSilence { .. } => PhaseKind::AwaitingSilence,
            Phase::Complete { .. } => PhaseKind::Complete,
        }
    }

    /// Field-level view of the state.
    pub fn snapshot(&self) -> SegmentationSnapshot {
        let (hold_start, no_observation_start) = match &self.phase {
            Phase::Holding { since, .. } => (Some(*since), None),
            Phase::Idle { .. } => (None, None),
            Phase::AwaitingSilence { since, .. } => (None, Some(*since)),
            Phase::Complete { silence_since, .. } => (None, *silence_since),
        };

        SegmentationSnapshot {
            sequence: self.sequence.clone(),
            last_confirmed_label: self.last_label().cloned(),
            hold_start,
            no_observation_start,
            last_observation_time: self.last_observation,
            sequence_complete: self.is_complete(),
        }
    }
}

/// A segmentation state bundled with its configuration.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    config: SegmenterConfig,
    state: SegmentationState,
}

impl Segmenter {
    /// Creates a segmenter with default tuning.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a segmenter with custom tuning.
    pub fn with_config(config: SegmenterConfig) -> Self {
        Self {
            config,
            state: SegmentationState::new(),
        }
    }

    /// Processes one observation.
    pub fn process(&mut self, observation: &Observation) -> OutputEvent {
        self.state.step(&self.config, observation)
    }

    pub fn state(&self) -> &SegmentationState {
        &self.state
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Drops the current sequence and timers.
    pub fn reset(&mut self) {
        self.state = SegmentationState::new();
    }
}
