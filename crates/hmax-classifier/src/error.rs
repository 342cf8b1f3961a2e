// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("{samples} samples but {labels} labels")]
    SampleLabelMismatch { samples: usize, labels: usize },

    #[error("Dimension mismatch: expected {expected} features, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Model has not been fitted yet")]
    NotFitted,

    #[error("Cannot fit on an empty sample set")]
    EmptyTrainingSet,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Blank label on line {line} of {path}")]
    BlankLabel { path: PathBuf, line: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ClassifierResult<T> = Result<T, ClassifierError>;
