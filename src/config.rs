use crate::defaults;
use crate::error::{Result, SignseqError};
use crate::segment::{BatchConfig, SegmenterConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub segmenter: SegmenterSection,
    pub batch: BatchSection,
    pub classifier: ClassifierSection,
    pub daemon: DaemonSection,
}

/// Live segmentation tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SegmenterSection {
    pub confidence_threshold: f32,
    pub hold_time_ms: u64,
    pub silence_timeout_ms: u64,
    pub label_forget_timeout_ms: u64,
}

/// Whole-clip aggregation tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BatchSection {
    pub confidence_threshold: f32,
    pub min_occurrence_count: usize,
}

/// Model and label map locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierSection {
    /// JSON label map (list or index-keyed object).
    pub label_map: Option<PathBuf>,
    /// JSON centroid model.
    pub centroids: Option<PathBuf>,
    pub feature_len: usize,
}

/// Daemon settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct DaemonSection {
    /// Overrides the runtime-dir socket path.
    pub socket: Option<PathBuf>,
}

impl Default for SegmenterSection {
    fn default() -> Self {
        Self {
            confidence_threshold: defaults::CONFIDENCE_THRESHOLD,
            hold_time_ms: defaults::HOLD_TIME_MS,
            silence_timeout_ms: defaults::SILENCE_TIMEOUT_MS,
            label_forget_timeout_ms: defaults::LABEL_FORGET_TIMEOUT_MS,
        }
    }
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            confidence_threshold: defaults::CONFIDENCE_THRESHOLD,
            min_occurrence_count: defaults::MIN_OCCURRENCE_COUNT,
        }
    }
}

impl Default for ClassifierSection {
    fn default() -> Self {
        Self {
            label_map: None,
            centroids: None,
            feature_len: defaults::FEATURE_LEN,
        }
    }
}

impl SegmenterSection {
    pub fn to_segmenter_config(&self) -> SegmenterConfig {
        SegmenterConfig {
            confidence_threshold: self.confidence_threshold,
            hold_time: Duration::from_millis(self.hold_time_ms),
            silence_timeout: Duration::from_millis(self.silence_timeout_ms),
            label_forget_timeout: Duration::from_millis(self.label_forget_timeout_ms),
        }
    }
}

impl BatchSection {
    pub fn to_batch_config(&self) -> BatchConfig {
        BatchConfig {
            confidence_threshold: self.confidence_threshold,
            min_occurrence_count: self.min_occurrence_count,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SignseqError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                SignseqError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(SignseqError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - SIGNSEQ_CONFIDENCE_THRESHOLD → segmenter.confidence_threshold
    /// - SIGNSEQ_HOLD_TIME_MS → segmenter.hold_time_ms
    /// - SIGNSEQ_SILENCE_TIMEOUT_MS → segmenter.silence_timeout_ms
    /// - SIGNSEQ_LABEL_MAP → classifier.label_map
    /// - SIGNSEQ_SOCKET → daemon.socket
    ///
    /// Unparseable numbers are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var("SIGNSEQ_CONFIDENCE_THRESHOLD")
            && let Ok(threshold) = value.trim().parse::<f32>()
        {
            self.segmenter.confidence_threshold = threshold;
        }

        if let Ok(value) = std::env::var("SIGNSEQ_HOLD_TIME_MS")
            && let Ok(ms) = value.trim().parse::<u64>()
        {
            self.segmenter.hold_time_ms = ms;
        }

        if let Ok(value) = std::env::var("SIGNSEQ_SILENCE_TIMEOUT_MS")
            && let Ok(ms) = value.trim().parse::<u64>()
        {
            self.segmenter.silence_timeout_ms = ms;
        }

        if let Ok(path) = std::env::var("SIGNSEQ_LABEL_MAP")
            && !path.is_empty()
        {
            self.classifier.label_map = Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("SIGNSEQ_SOCKET")
            && !path.is_empty()
        {
            self.daemon.socket = Some(PathBuf::from(path));
        }

        self
    }

    /// Rejects values the segmenter and aggregator cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.segmenter.to_segmenter_config().validate()?;

        if !(0.0..1.0).contains(&self.batch.confidence_threshold) {
            return Err(SignseqError::ConfigInvalidValue {
                key: "batch.confidence_threshold".to_string(),
                message: format!("{} is outside [0, 1)", self.batch.confidence_threshold),
            });
        }
        if self.classifier.feature_len == 0 {
            return Err(SignseqError::ConfigInvalidValue {
                key: "classifier.feature_len".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Default configuration rendered as TOML.
    pub fn dump_template() -> Result<String> {
        toml::to_string_pretty(&Self::default()).map_err(|e| SignseqError::Other(e.to_string()))
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/signseq/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("signseq")
            .join("config.toml")
    }
}
