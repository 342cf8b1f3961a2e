// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::{ClassifierError, ClassifierResult};
use ndarray::Array2;
use std::path::Path;
use tracing::debug;

/// Feature vectors (one row per image) and their labels, paired by position
#[derive(Debug, Clone, PartialEq)]
pub struct SampleMatrix {
    features: Array2<f64>,
    labels: Vec<String>,
}

impl SampleMatrix {
    /// Build from rows of equal length. Row and label counts may differ here;
    /// [`SampleMatrix::ensure_aligned`] checks them.
    pub fn new(rows: Vec<Vec<f64>>, labels: Vec<String>) -> ClassifierResult<Self> {
        let n_features = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|r| r.len() != n_features) {
            return Err(ClassifierError::DimensionMismatch {
                expected: n_features,
                got: bad.len(),
            });
        }
        let n_samples = rows.len();
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let features = Array2::from_shape_vec((n_samples, n_features), flat).map_err(|e| {
            ClassifierError::InvalidParameter(format!("sample matrix shape: {}", e))
        })?;
        Ok(Self { features, labels })
    }

    /// Build from spike-count response vectors
    pub fn from_counts(rows: &[Vec<u64>], labels: Vec<String>) -> ClassifierResult<Self> {
        let rows = rows
            .iter()
            .map(|r| r.iter().map(|c| *c as f64).collect())
            .collect();
        Self::new(rows, labels)
    }

    /// Require exactly one label per sample
    pub fn ensure_aligned(&self) -> ClassifierResult<()> {
        if self.features.nrows() != self.labels.len() {
            return Err(ClassifierError::SampleLabelMismatch {
                samples: self.features.nrows(),
                labels: self.labels.len(),
            });
        }
        Ok(())
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.features.nrows() == 0
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }
}

/// Read newline-delimited class labels. Trailing blank lines are ignored;
/// a blank line before the last label is an error.
pub fn load_labels<P: AsRef<Path>>(path: P) -> ClassifierResult<Vec<String>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let mut labels: Vec<String> = text.lines().map(|l| l.trim().to_string()).collect();
    while labels.last().is_some_and(String::is_empty) {
        labels.pop();
    }
    if let Some(line) = labels.iter().position(String::is_empty) {
        return Err(ClassifierError::BlankLabel {
            path: path.to_path_buf(),
            line: line + 1,
        });
    }
    debug!(target: "hmax-classifier", "Loaded {} labels from {}", labels.len(), path.display());
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn labels(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_alignment() {
        let samples = SampleMatrix::from_counts(&[vec![1, 2], vec![3, 4]], labels(&["a", "b"])).unwrap();
        samples.ensure_aligned().unwrap();
        assert_eq!(samples.n_features(), 2);
        assert_eq!(samples.features()[[1, 0]], 3.0);

        let short = SampleMatrix::from_counts(&[vec![1, 2], vec![3, 4]], labels(&["a"])).unwrap();
        assert!(matches!(
            short.ensure_aligned(),
            Err(ClassifierError::SampleLabelMismatch { samples: 2, labels: 1 })
        ));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = SampleMatrix::new(vec![vec![1.0, 2.0], vec![1.0]], labels(&["a", "b"]));
        assert!(matches!(result, Err(ClassifierError::DimensionMismatch { expected: 2, got: 1 })));
    }

    #[test]
    fn test_load_labels_ignores_trailing_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("labels.txt");
        std::fs::write(&path, "cat\ndog\r\ncat\n\n\n").unwrap();
        assert_eq!(load_labels(&path).unwrap(), labels(&["cat", "dog", "cat"]));

        std::fs::write(&path, "cat\n\ndog\n").unwrap();
        assert!(matches!(load_labels(&path), Err(ClassifierError::BlankLabel { line: 2, .. })));
    }
}
