//! Classifier index to label name lookup.

use crate::error::{Result, SignseqError};
use crate::segment::observation::Label;
use log::warn;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

/// On-disk forms: `["hello", "thanks"]` or `{"0": "hello", "1": "thanks"}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum LabelMapFile {
    List(Vec<String>),
    Indexed(BTreeMap<String, String>),
}

/// Maps classifier output indices to label names.
///
/// Indices not present in the map resolve to [`Label::Unknown`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
    names: BTreeMap<usize, String>,
}

impl LabelMap {
    /// Builds a map from names in index order.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .enumerate()
                .map(|(i, n)| (i, n.into()))
                .collect(),
        }
    }

    /// Parses a JSON label map.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: LabelMapFile =
            serde_json::from_str(json).map_err(|e| SignseqError::LabelMapParse {
                message: e.to_string(),
            })?;

        match file {
            LabelMapFile::List(names) => Ok(Self::from_names(names)),
            LabelMapFile::Indexed(entries) => {
                let mut names = BTreeMap::new();
                for (key, name) in entries {
                    let index = key.trim().parse::<usize>().map_err(|_| {
                        SignseqError::LabelMapParse {
                            message: format!("'{}' is not a class index", key),
                        }
                    })?;
                    names.insert(index, name);
                }
                Ok(Self { names })
            }
        }
    }

    /// Loads a JSON label map from disk and warns about gaps.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SignseqError::LabelMapNotFound {
                    path: path.display().to_string(),
                }
            } else {
                SignseqError::Io(e)
            }
        })?;
        let map = Self::from_json(&contents)?;

        for gap in map.gaps() {
            if gap.start() == gap.end() {
                warn!("Index {} is missing from label map {}", gap.start(), path.display());
            } else {
                warn!(
                    "Indices {}..={} are missing from label map {}",
                    gap.start(),
                    gap.end(),
                    path.display()
                );
            }
        }
        Ok(map)
    }

    /// Resolves a classifier index.
    pub fn resolve(&self, index: usize) -> Label {
        match self.names.get(&index) {
            Some(name) => Label::from_wire(name),
            None => Label::Unknown,
        }
    }

    /// Runs of unmapped indices below the highest mapped one.
    pub fn gaps(&self) -> Vec<RangeInclusive<usize>> {
        let mut gaps = Vec::new();
        let mut expected = 0;
        for &index in self.names.keys() {
            if index > expected {
                gaps.push(expected..=index - 1);
            }
            expected = index.saturating_add(1);
        }
        gaps
    }

    /// Warns if the classifier can emit more or fewer classes than mapped.
    pub fn check_class_count(&self, class_count: usize) {
        if class_count != self.names.len() {
            warn!(
                "Classifier has {} output classes, but label map has {} entries",
                class_count,
                self.names.len()
            );
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Label names in index order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.values().map(String::as_str)
    }
}
