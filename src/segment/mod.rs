//! Gesture sequence segmentation.
//!
//! ```text
//! ┌────────────┐   Observation   ┌──────────────┐   OutputEvent
//! │ Classifier │────────────────▶│  Segmenter   │──────────────▶ transport
//! └────────────┘   (per frame)   │ (per session)│
//!                                └──────────────┘
//!
//! ┌────────────┐   whole clip    ┌──────────────┐   ClipResult
//! │  Uploads   │────────────────▶│  aggregate   │──────────────▶ transport
//! └────────────┘                 └──────────────┘
//! ```

pub mod batch;
pub mod event;
pub mod machine;
pub mod observation;

pub use batch::{BatchConfig, ClipResult, aggregate, process_clip};
pub use event::{OutputEvent, Transition};
pub use machine::{
    PhaseKind, SegmentationSnapshot, SegmentationState, Segmenter, SegmenterConfig,
};
pub use observation::{Label, Observation, ObservationRecord};
