//! Nearest-centroid classifier.
//!
//! Each class is represented by the mean landmark vector of its training
//! samples. Confidence is a softmax over negative distances, so a frame far
//! from every centroid spreads its probability and falls under the
//! segmenter's threshold.

use crate::classify::classifier::{Classification, Classifier};
use crate::error::{Result, SignseqError};
use serde::Deserialize;
use std::fs;
use std::path::Path;

fn default_temperature() -> f32 {
    0.05
}

/// JSON model file: `{"centroids": [[...], ...], "temperature": 0.05}`.
#[derive(Debug, Clone, Deserialize)]
struct CentroidModel {
    centroids: Vec<Vec<f32>>,
    #[serde(default = "default_temperature")]
    temperature: f32,
}

/// Classifier backed by per-class centroid vectors.
#[derive(Debug, Clone)]
pub struct CentroidClassifier {
    name: String,
    centroids: Vec<Vec<f32>>,
    temperature: f32,
}

impl CentroidClassifier {
    /// Creates a classifier from centroids of equal length.
    pub fn new(name: &str, centroids: Vec<Vec<f32>>, temperature: f32) -> Result<Self> {
        let Some(first) = centroids.first() else {
            return Err(SignseqError::Classifier {
                message: "centroid model has no classes".to_string(),
            });
        };
        let dims = first.len();
        if let Some(bad) = centroids.iter().position(|c| c.len() != dims) {
            return Err(SignseqError::Classifier {
                message: format!(
                    "centroid {} has {} values, expected {}",
                    bad,
                    centroids[bad].len(),
                    dims
                ),
            });
        }
        if !(temperature.is_finite() && temperature > 0.0) {
            return Err(SignseqError::Classifier {
                message: format!("temperature must be positive, got {}", temperature),
            });
        }

        Ok(Self {
            name: name.to_string(),
            centroids,
            temperature,
        })
    }

    /// Loads a JSON centroid model.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let model: CentroidModel = serde_json::from_str(&contents)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("centroid");
        Self::new(name, model.centroids, model.temperature)
    }

    /// Length of the feature vectors this model expects.
    pub fn dimensions(&self) -> usize {
        self.centroids.first().map_or(0, Vec::len)
    }
}

impl Classifier for CentroidClassifier {
    fn classify(&self, features: &[f32]) -> Result<Classification> {
        if features.len() != self.dimensions() {
            return Err(SignseqError::Classifier {
                message: format!(
                    "expected {} features, got {}",
                    self.dimensions(),
                    features.len()
                ),
            });
        }

        let logits: Vec<f32> = self
            .centroids
            .iter()
            .map(|c| {
                let distance = c
                    .iter()
                    .zip(features)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f32>()
                    .sqrt();
                -distance / self.temperature
            })
            .collect();

        // Subtract the max logit for a numerically stable softmax.
        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let weights: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f32 = weights.iter().sum();

        let (index, best) = weights
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::MIN), |acc, (i, w)| if w > acc.1 { (i, w) } else { acc });

        Ok(Classification::Prediction {
            index,
            confidence: best / total,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn class_count(&self) -> usize {
        self.centroids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn two_class() -> CentroidClassifier {
        CentroidClassifier::new("test", vec![vec![0.0, 0.0], vec![1.0, 1.0]], 0.05).unwrap()
    }

    fn prediction(result: Classification) -> (usize, f32) {
        match result {
            Classification::Prediction { index, confidence } => (index, confidence),
            Classification::NoHand => panic!("expected prediction"),
        }
    }

    #[test]
    fn test_picks_nearest_centroid_confidently() {
        let (index, confidence) = prediction(two_class().classify(&[0.95, 1.0]).unwrap());
        assert_eq!(index, 1);
        assert!(confidence > 0.99, "got {confidence}");
    }

    #[test]
    fn test_midpoint_is_ambiguous() {
        let (_, confidence) = prediction(two_class().classify(&[0.5, 0.5]).unwrap());
        assert!((confidence - 0.5).abs() < 1e-4, "got {confidence}");
    }

    #[test]
    fn test_wrong_dimensions_is_error() {
        assert!(two_class().classify(&[0.0]).is_err());
    }

    #[test]
    fn test_rejects_ragged_centroids() {
        let result = CentroidClassifier::new("r", vec![vec![0.0, 0.0], vec![1.0]], 0.05);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_empty_model() {
        assert!(CentroidClassifier::new("e", vec![], 0.05).is_err());
    }

    #[test]
    fn test_rejects_non_positive_temperature() {
        assert!(CentroidClassifier::new("t", vec![vec![0.0]], 0.0).is_err());
    }

    #[test]
    fn test_load_from_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"centroids": [[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]}"#)
            .unwrap();

        let classifier = CentroidClassifier::load(file.path()).unwrap();
        assert_eq!(classifier.class_count(), 2);
        assert_eq!(classifier.dimensions(), 3);
    }
}
