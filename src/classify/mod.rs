//! Classification boundary: feature vectors in, observations out.

pub mod centroid;
pub mod classifier;
pub mod labels;

pub use centroid::CentroidClassifier;
pub use classifier::{
    Classification, Classifier, MockClassifier, NullClassifier, ObservationSource,
};
pub use labels::LabelMap;
