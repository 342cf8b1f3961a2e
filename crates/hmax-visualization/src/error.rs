// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum VisualizationError {
    #[error("No feature template for '{0}'")]
    MissingTemplate(String),

    #[error("Feature template '{label}' is {actual:?}, expected {expected:?} like the others")]
    TemplateSizeMismatch {
        label: String,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Kernel has feature size {kernel}, reconstruction asked for {requested}")]
    KernelSize { kernel: usize, requested: usize },

    #[error("{count} spike counts do not fill a {rows}x{cols} layer")]
    CountMismatch { rows: usize, cols: usize, count: usize },

    #[error("Image error for {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type VisualizationResult<T> = Result<T, VisualizationError>;
