use crate::classify::labels::LabelMap;
use crate::defaults;
use crate::error::{Result, SignseqError};
use crate::segment::observation::Observation;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Instant;

/// Raw classifier output for one feature vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classification {
    /// The classifier saw no hand.
    NoHand,
    /// Most likely class and its probability.
    Prediction { index: usize, confidence: f32 },
}

/// Trait for frame-to-label classification.
///
/// This trait allows swapping implementations (real model vs mock).
pub trait Classifier: Send + Sync {
    /// Classify one landmark feature vector.
    ///
    /// # Arguments
    /// * `features` - x/y pairs for each landmark, already length-checked
    fn classify(&self, features: &[f32]) -> Result<Classification>;

    /// Name of the loaded model.
    fn name(&self) -> &str;

    /// Number of classes the model can emit.
    fn class_count(&self) -> usize;
}

/// Implement Classifier for Arc<T> to allow sharing across sessions.
impl<T: Classifier + ?Sized> Classifier for Arc<T> {
    fn classify(&self, features: &[f32]) -> Result<Classification> {
        (**self).classify(features)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn class_count(&self) -> usize {
        (**self).class_count()
    }
}

/// Turns feature vectors into observations.
///
/// Malformed input never fails: a vector of the wrong length, non-finite
/// values, or a classifier error all degrade to "no observation" for that
/// frame so the session stays alive.
#[derive(Clone)]
pub struct ObservationSource {
    classifier: Arc<dyn Classifier>,
    labels: LabelMap,
    feature_len: usize,
}

impl ObservationSource {
    /// Creates a source expecting `feature_len` values per frame.
    pub fn new(classifier: Arc<dyn Classifier>, labels: LabelMap, feature_len: usize) -> Self {
        labels.check_class_count(classifier.class_count());
        Self {
            classifier,
            labels,
            feature_len,
        }
    }

    /// Creates a source for the standard 21-landmark hand layout.
    pub fn with_default_layout(classifier: Arc<dyn Classifier>, labels: LabelMap) -> Self {
        Self::new(classifier, labels, defaults::FEATURE_LEN)
    }

    /// Classifies `features` seen at `timestamp`. `None` means no landmarks.
    pub fn observe(&self, features: Option<&[f32]>, timestamp: Instant) -> Observation {
        let Some(features) = features else {
            return Observation::none(timestamp);
        };

        if features.len() != self.feature_len {
            warn!(
                "Dropping frame: expected {} features, got {}",
                self.feature_len,
                features.len()
            );
            return Observation::none(timestamp);
        }
        if features.iter().any(|v| !v.is_finite()) {
            warn!("Dropping frame: non-finite landmark value");
            return Observation::none(timestamp);
        }

        match self.classifier.classify(features) {
            Ok(Classification::NoHand) => Observation::none(timestamp),
            Ok(Classification::Prediction { index, confidence }) => {
                let label = self.labels.resolve(index);
                let confidence = if confidence.is_finite() {
                    confidence.clamp(0.0, 1.0)
                } else {
                    0.0
                };
                debug!(
                    "Predicted {} (index {}) with confidence {:.2}",
                    label, index, confidence
                );
                Observation::new(label, confidence, timestamp)
            }
            Err(e) => {
                warn!("Classifier '{}' failed: {}", self.classifier.name(), e);
                Observation::none(timestamp)
            }
        }
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn feature_len(&self) -> usize {
        self.feature_len
    }
}

/// Stand-in when no model is configured; every frame is "no hand".
///
/// Clients are expected to send pre-classified observations instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullClassifier;

impl Classifier for NullClassifier {
    fn classify(&self, _features: &[f32]) -> Result<Classification> {
        Ok(Classification::NoHand)
    }

    fn name(&self) -> &str {
        "none"
    }

    fn class_count(&self) -> usize {
        0
    }
}

/// Mock classifier for testing
#[derive(Debug, Clone)]
pub struct MockClassifier {
    name: String,
    response: Classification,
    class_count: usize,
    should_fail: bool,
}

impl MockClassifier {
    /// Create a mock that always predicts class 0 with confidence 0.9
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            response: Classification::Prediction {
                index: 0,
                confidence: 0.9,
            },
            class_count: 1,
            should_fail: false,
        }
    }

    /// Configure the mock to return a specific prediction
    pub fn with_prediction(mut self, index: usize, confidence: f32) -> Self {
        self.response = Classification::Prediction { index, confidence };
        self
    }

    /// Configure the mock to report no hand
    pub fn with_no_hand(mut self) -> Self {
        self.response = Classification::NoHand;
        self
    }

    /// Configure the advertised number of classes
    pub fn with_class_count(mut self, class_count: usize) -> Self {
        self.class_count = class_count;
        self
    }

    /// Configure the mock to fail on classify
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl Classifier for MockClassifier {
    fn classify(&self, _features: &[f32]) -> Result<Classification> {
        if self.should_fail {
            Err(SignseqError::Classifier {
                message: "mock classification failure".to_string(),
            })
        } else {
            Ok(self.response)
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn class_count(&self) -> usize {
        self.class_count
    }
}
